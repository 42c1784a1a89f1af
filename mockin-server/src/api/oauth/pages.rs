//! HTML pages shown to the resource owner during interactive authorization.

use consent_engine::{Permission, Prompt};

const STYLE: &str = r#"
    body { font-family: Arial, sans-serif; max-width: 480px; margin: 50px auto; padding: 20px; }
    .form-group { margin-bottom: 15px; }
    label { display: block; margin-bottom: 5px; }
    input { width: 100%; padding: 8px; border: 1px solid #ddd; border-radius: 4px; }
    button { background: #007bff; color: white; padding: 10px 20px; border: none; border-radius: 4px; cursor: pointer; }
    button.secondary { background: #6c757d; }
    .error { color: #b00020; }
    .permission-list { background: #f8f9fa; padding: 10px; border-radius: 4px; margin: 10px 0; }
"#;

/// Renders the page for a suspended flow. The form posts back to `action`.
pub fn render(prompt: &Prompt, action: &str) -> String {
    match prompt {
        Prompt::Login { error } => login_page(action, error.as_deref()),
        Prompt::Consent {
            permissions,
            owner_name,
        } => consent_page(action, permissions, owner_name.as_deref()),
    }
}

fn login_page(action: &str, error: Option<&str>) -> String {
    let error = error
        .map(|error| format!(r#"<p class="error">{}</p>"#, escape(error)))
        .unwrap_or_default();
    page(
        "Login",
        &format!(
            r#"
    <h2>Login</h2>
    {error}
    <form method="post" action="{action}">
        <div class="form-group">
            <label for="username">Username:</label>
            <input type="text" id="username" name="username">
        </div>
        <div class="form-group">
            <label for="password">Password:</label>
            <input type="password" id="password" name="password">
        </div>
        <button type="submit" name="login" value="true">Login</button>
        <button type="submit" name="login" value="false" class="secondary">Cancel</button>
    </form>"#,
            action = escape(action),
        ),
    )
}

fn consent_page(action: &str, permissions: &[Permission], owner_name: Option<&str>) -> String {
    let items: String = permissions
        .iter()
        .map(|permission| format!("<li>{}</li>", escape(permission.as_str())))
        .collect();
    let greeting = owner_name
        .map(|name| format!("<p>Hello, {}.</p>", escape(name)))
        .unwrap_or_default();
    page(
        "Consent",
        &format!(
            r#"
    <h2>Consent</h2>
    {greeting}
    <p>The application is requesting the following permissions:</p>
    <div class="permission-list"><ul>{items}</ul></div>
    <form method="post" action="{action}">
        <button type="submit" name="consent" value="true">Accept</button>
        <button type="submit" name="consent" value="false" class="secondary">Reject</button>
    </form>"#,
            action = escape(action),
        ),
    )
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <style>{STYLE}</style>
</head>
<body>{body}
</body>
</html>
"#
    )
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
