use anyhow::Result;
use datagram_talk::{listener, talker};
use net_basics::Family;
use tokio::time::{Duration, timeout};

#[tokio::test]
async fn talker_reaches_listener() -> Result<()> {
    let socket = listener::bind(Some("127.0.0.1"), 0, Family::V4).await?;
    let port = socket.local_addr()?.port();

    let sent = talker::send_message("127.0.0.1", port, Family::V4, b"hello there").await?;
    assert_eq!(sent, 11);

    let packet = timeout(Duration::from_secs(2), listener::receive_one(&socket)).await??;
    assert_eq!(packet.text(), "hello there");
    assert!(packet.from.ip().is_loopback());
    Ok(())
}

#[tokio::test]
async fn oversized_datagram_is_truncated() -> Result<()> {
    let socket = listener::bind(Some("127.0.0.1"), 0, Family::V4).await?;
    let port = socket.local_addr()?.port();

    let message = vec![b'z'; 150];
    talker::send_message("127.0.0.1", port, Family::V4, &message).await?;

    let packet = timeout(Duration::from_secs(2), listener::receive_one(&socket)).await??;
    assert_eq!(packet.payload.len(), listener::MAX_BUF_LEN - 1);
    Ok(())
}

#[tokio::test]
async fn family_mismatch_has_no_destination() {
    let result = talker::send_message("127.0.0.1", 4950, Family::V6, b"x").await;
    assert!(result.is_err());
}
