pub mod check;
pub mod init;
pub mod report;
pub mod suggest;

use tokio_util::sync::CancellationToken;

/// Token cancelled on Ctrl-C
pub fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, cancelling request");
            trigger.cancel();
        }
    });
    token
}
