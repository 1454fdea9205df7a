use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use url::Url;

use carelens_auth::{AuthError, CallbackOutcome, ProviderConfig, SessionController};
use carelens_fhir::SmartChartFetcher;
use carelens_relay::RelayServer;

use crate::browser::SystemBrowser;
use crate::output::{print_chart, print_error, print_success};

/// Full sign-in flow: start the embedded callback relay, open the
/// browser, wait for the relayed code, exchange it and render the chart.
/// The session is then held until token expiry or Ctrl-C.
pub async fn login(port: u16) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(8);
    let server = RelayServer::bind(port, tx)
        .await
        .context("Is another callback relay already running on this port?")?;
    let port = server.port();
    tokio::spawn(server.serve());

    let redirect_uri = Url::parse(&format!("http://localhost:{port}"))?;
    let config = ProviderConfig::epic_sandbox().with_redirect_uri(redirect_uri);
    let fetcher = Arc::new(SmartChartFetcher::new(config.fhir_base_url.clone()));
    let controller =
        SessionController::new(config, Arc::new(SystemBrowser)).with_fetcher(fetcher);

    let auth_url = controller.sign_in().await?;
    println!("Opened the browser for sign-in. If nothing happened, visit:");
    println!("  {auth_url}");
    println!("Waiting for the authorization callback...");

    loop {
        tokio::select! {
            received = rx.recv() => {
                let callback = received.context("callback relay stopped")?;
                match controller.handle_callback(callback).await {
                    Ok(CallbackOutcome::Ignored) => continue,
                    Ok(CallbackOutcome::Completed { chart, fetch_error }) => {
                        print_success("Signed in");
                        if let Some(chart) = chart {
                            print_chart(&chart);
                        }
                        if let Some(err) = fetch_error {
                            print_error(&err);
                        }
                        break;
                    }
                    Err(AuthError::StateMismatch) => {
                        print_error("Ignoring a callback with a mismatched state value");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                controller.sign_out().await;
                println!("Sign-in cancelled.");
                return Ok(());
            }
        }
    }

    println!();
    println!("Session active. Press Ctrl-C to sign out.");
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                controller.sign_out().await;
                print_success("Signed out");
                return Ok(());
            }
            () = tokio::time::sleep(Duration::from_secs(1)) => {
                if !controller.session().await.authenticated() {
                    println!("Session expired; signed out.");
                    return Ok(());
                }
            }
        }
    }
}
