use std::thread;
use std::time::Duration;

const MAX_RETRIES: usize = 3;
const BASE_DELAY_MS: u64 = 200;

/// Send a request, retrying transient failures with a linear backoff. The
/// request builder is rebuilt for every attempt.
pub(crate) fn send_with_retries<F>(
    mut make_req: F,
) -> Result<reqwest::blocking::Response, reqwest::Error>
where
    F: FnMut() -> reqwest::blocking::RequestBuilder,
{
    let mut attempt = 0usize;
    loop {
        let response = make_req().send();
        match response {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if attempt < MAX_RETRIES && is_retryable_status(status) {
                    let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                    thread::sleep(Duration::from_millis(delay));
                    attempt += 1;
                    continue;
                }
                return Ok(resp);
            }
            Err(err) => {
                if attempt < MAX_RETRIES && is_retryable_error(&err) {
                    let delay = BASE_DELAY_MS * (attempt as u64 + 1);
                    thread::sleep(Duration::from_millis(delay));
                    attempt += 1;
                    continue;
                }
                return Err(err);
            }
        }
    }
}

pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

pub(crate) fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
