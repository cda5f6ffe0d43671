use keyvo::daemon::Shutdown;
use nix::sys::signal::{Signal, raise};
use std::time::Duration;
use tokio::time::{sleep, timeout};

#[tokio::test]
async fn hangup_is_ignored_and_terminate_stops_the_wait() {
    let shutdown = Shutdown::register().unwrap();
    let waiting = tokio::spawn(shutdown.wait());

    raise(Signal::SIGHUP).unwrap();
    sleep(Duration::from_millis(100)).await;
    assert!(!waiting.is_finished());

    raise(Signal::SIGTERM).unwrap();
    timeout(Duration::from_secs(5), waiting)
        .await
        .expect("shutdown not observed")
        .unwrap();
}
