//! Server-rendered HTML for the callback relay.

const SHARED_STYLES: &str = r#"
body {
    font-family: Arial, sans-serif;
    text-align: center;
    padding: 50px;
}
.container {
    max-width: 500px;
    margin: 0 auto;
}
.success { color: #28a745; }
.info { color: #007bff; }
"#;

/// Confirmation page served after a successful authorization redirect.
///
/// The embedded script relays the code and state to the window that
/// opened the popup, then closes it. The values are JSON-encoded (with
/// `<` escaped) so they cannot break out of the script context.
pub fn success_page(code: &str, state: &str) -> String {
    let message = serde_json::json!({
        "type": "EPIC_AUTH_SUCCESS",
        "code": code,
        "state": state,
    });
    let message = serde_json::to_string(&message)
        .unwrap_or_default()
        .replace('<', "\\u003c");

    format!(
        r#"<html>
  <head>
    <title>Authorization Successful</title>
    <style>{SHARED_STYLES}</style>
  </head>
  <body>
    <div class="container">
      <h2 class="success">&#10003; Authorization Successful</h2>
      <p>You have successfully connected. You can close this window and return to the app.</p>
      <p><small>Authorization code received and being processed...</small></p>
    </div>
    <script>
      var message = {message};
      if (window.opener) {{
        window.opener.postMessage(message, '*');
        window.close();
      }}
    </script>
  </body>
</html>"#
    )
}

/// Status page served when the relay is hit without an authorization
/// code.
pub fn status_page(port: u16) -> String {
    format!(
        r#"<html>
  <head>
    <title>SMART FHIR OAuth Callback Server</title>
    <style>{SHARED_STYLES}</style>
  </head>
  <body>
    <div class="container">
      <h2 class="info">SMART FHIR OAuth Callback Server</h2>
      <p>This server is ready to handle OAuth callbacks.</p>
      <p><strong>Callback URL:</strong> http://localhost:{port}</p>
      <p><strong>Health Check:</strong> <a href="/health">http://localhost:{port}/health</a></p>
    </div>
  </body>
</html>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_page_embeds_message() {
        let page = success_page("code-123", "state-abc");
        assert!(page.contains("EPIC_AUTH_SUCCESS"));
        assert!(page.contains("code-123"));
        assert!(page.contains("state-abc"));
        assert!(page.contains("window.opener.postMessage"));
        assert!(page.contains("window.close()"));
    }

    #[test]
    fn success_page_escapes_script_breakout() {
        let page = success_page("</script><script>alert(1)</script>", "s");
        assert!(!page.contains("</script><script>alert(1)"));
    }

    #[test]
    fn status_page_names_endpoints() {
        let page = status_page(3000);
        assert!(page.contains("http://localhost:3000"));
        assert!(page.contains("/health"));
        assert!(!page.contains("EPIC_AUTH_SUCCESS"));
    }
}
