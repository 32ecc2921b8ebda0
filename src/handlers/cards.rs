use axum::{
    extract::{Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use uuid::Uuid;

use crate::{
    errors::Result,
    handlers::profiles::fetch_profile_summary,
    models::ProfileCardData,
    shaping::card_data,
    AppState,
};

const SITE_NAME: &str = "Matrimony";

pub fn router() -> Router<AppState> {
    Router::new().route("/p/:user_id", get(profile_card))
}

/// GET /p/:user_id
///
/// Public link-preview page. Only the card fields are rendered, never the
/// full profile.
pub async fn profile_card(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Response> {
    let Ok(user_id) = user_id.parse::<Uuid>() else {
        return Ok(not_found_response());
    };

    let Some(summary) = fetch_profile_summary(&state.db, user_id, true).await? else {
        return Ok(not_found_response());
    };

    let html = generate_card_html(&card_data(&summary), state.config.public_base_url.as_deref());
    let mut response = Html(html).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("public, max-age=300"),
    );
    Ok(response)
}

fn not_found_response() -> Response {
    let html = generate_error_html(
        "Profile Not Found",
        "This profile does not exist or is no longer active.",
    );
    (StatusCode::NOT_FOUND, Html(html)).into_response()
}

fn card_description(data: &ProfileCardData) -> String {
    let mut parts = Vec::new();
    if let Some(age) = data.age {
        parts.push(format!("{} yrs", age));
    }
    if let Some(height) = &data.height_label {
        parts.push(height.clone());
    }
    if let Some(location) = &data.location {
        parts.push(location.clone());
    }
    parts.join(" • ")
}

/// Card address, absolute when a public base URL is configured.
fn card_url(user_id: Uuid, base_url: Option<&str>) -> String {
    format!("{}/p/{}", base_url.unwrap_or(""), user_id)
}

fn generate_card_html(data: &ProfileCardData, base_url: Option<&str>) -> String {
    let title = html_escape(&data.display_name);
    let page_url = html_escape(&card_url(data.user_id, base_url));
    let description = html_escape(&card_description(data));

    let (image_meta, image_tag) = match &data.photo_url {
        Some(url) => {
            let url = html_escape(url);
            (
                format!("<meta property=\"og:image\" content=\"{url}\">\n    <meta name=\"twitter:image\" content=\"{url}\">"),
                format!("<img class=\"photo\" src=\"{url}\" alt=\"{title}\">"),
            )
        }
        None => (String::new(), String::new()),
    };
    let twitter_card = if data.photo_url.is_some() {
        "summary_large_image"
    } else {
        "summary"
    };

    format!("<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title} | {SITE_NAME}</title>
    <link rel=\"canonical\" href=\"{page_url}\">

    <meta property=\"og:type\" content=\"profile\">
    <meta property=\"og:url\" content=\"{page_url}\">
    <meta property=\"og:title\" content=\"{title}\">
    <meta property=\"og:description\" content=\"{description}\">
    <meta property=\"og:site_name\" content=\"{SITE_NAME}\">
    {image_meta}

    <meta name=\"twitter:card\" content=\"{twitter_card}\">
    <meta name=\"twitter:title\" content=\"{title}\">
    <meta name=\"twitter:description\" content=\"{description}\">

    <style>
        body {{
            font-family: Arial, sans-serif;
            max-width: 480px;
            margin: 40px auto;
            padding: 20px;
            background-color: #f7f3f0;
        }}
        .profile-card {{
            background: white;
            border-radius: 12px;
            padding: 24px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
            text-align: center;
        }}
        .photo {{
            width: 160px;
            height: 160px;
            border-radius: 50%;
            object-fit: cover;
            margin-bottom: 16px;
        }}
        .name {{
            font-size: 24px;
            font-weight: bold;
            color: #b03a5b;
            margin-bottom: 8px;
        }}
        .details {{
            font-size: 16px;
            color: #555;
        }}
    </style>
</head>
<body>
    <div class=\"profile-card\">
        {image_tag}
        <div class=\"name\">{title}</div>
        <div class=\"details\">{description}</div>
    </div>
</body>
</html>")
}

fn generate_error_html(title: &str, message: &str) -> String {
    let title = html_escape(title);
    let message = html_escape(message);
    format!("<!DOCTYPE html>
<html lang=\"en\">
<head>
    <meta charset=\"UTF-8\">
    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">
    <title>{title}</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            max-width: 600px;
            margin: 50px auto;
            padding: 20px;
            text-align: center;
            background-color: #f7f3f0;
        }}
        .error-card {{
            background: white;
            border-radius: 10px;
            padding: 30px;
            box-shadow: 0 2px 10px rgba(0,0,0,0.1);
        }}
        .error-title {{
            font-size: 24px;
            color: #f44336;
            margin-bottom: 15px;
        }}
        .error-message {{
            font-size: 16px;
            color: #666;
        }}
    </style>
</head>
<body>
    <div class=\"error-card\">
        <div class=\"error-title\">{title}</div>
        <div class=\"error-message\">{message}</div>
    </div>
</body>
</html>")
}

fn html_escape(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
