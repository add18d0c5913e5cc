//! Server-rendered pages

use axum::response::Html;
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::auth::MaybeSession;

/// GET /
///
/// Renders the home page for the signed-in user, or for the demo identity
/// with a sign-in link.
pub async fn index_handler(session: MaybeSession) -> Html<String> {
    Html(render_index(&session))
}

pub fn render_index(session: &MaybeSession) -> String {
    let name = encode_text(session.user_name());
    let picture = encode_double_quoted_attribute(session.profile_picture_url());

    let action = if session.is_authenticated() {
        r#"<form method="post" action="/auth/logout"><button type="submit">Sign out</button></form>"#
    } else {
        r#"<a href="/auth/google/login">Sign in with Google</a>"#
    };

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>Starter Kit</title>
    <link rel="stylesheet" href="/static/styles.css">
</head>
<body>
    <header>
        <img class="avatar" src="{picture}" alt="Profile picture" width="40" height="40">
        <span class="user-name">{name}</span>
        {action}
    </header>
    <main>
        <h1>Welcome, {name}</h1>
    </main>
</body>
</html>
"#
    )
}
