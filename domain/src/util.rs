//! Log preview helpers.

use std::borrow::Cow;

/// Marker appended to a preview that was cut short.
pub const PREVIEW_ELLIPSIS: &str = "...";

/// One-line preview of user text or a wire payload for a tracing line.
///
/// Line breaks become spaces so multi-line prompts and pasted `kubectl`
/// output keep the log one record per line. Text longer than `max_bytes` is
/// cut on a UTF-8 character boundary and marked with [`PREVIEW_ELLIPSIS`].
pub fn log_preview(s: &str, max_bytes: usize) -> Cow<'_, str> {
    let cut = floor_char_boundary(s, max_bytes);
    let head = &s[..cut];
    let truncated = cut < s.len();
    if !truncated && !head.contains(['\n', '\r']) {
        return Cow::Borrowed(head);
    }

    let mut preview: String = head
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();
    if truncated {
        preview.push_str(PREVIEW_ELLIPSIS);
    }
    Cow::Owned(preview)
}

fn floor_char_boundary(s: &str, max_bytes: usize) -> usize {
    if s.len() <= max_bytes {
        return s.len();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_single_line_is_borrowed() {
        let preview = log_preview("kubectl get pods", 80);
        assert!(matches!(preview, Cow::Borrowed("kubectl get pods")));
    }

    #[test]
    fn long_prompt_is_cut_and_marked() {
        assert_eq!(log_preview("kubectl get pods -A", 7), "kubectl...");
    }

    #[test]
    fn kubectl_output_is_folded_to_one_line() {
        let output = "NAME    READY   STATUS\nweb-0   0/1     CrashLoopBackOff\r\n";
        assert_eq!(
            log_preview(output, 200),
            "NAME    READY   STATUS web-0   0/1     CrashLoopBackOff  "
        );
    }

    #[test]
    fn cut_backs_up_to_char_boundary() {
        // 'の' is 3 bytes, so a cut at byte 4 lands inside it.
        let s = "あのね";
        assert_eq!(log_preview(s, 4), "あ...");
        assert_eq!(log_preview(s, 6), "あの...");
        assert_eq!(log_preview(s, 9), "あのね");
    }

    #[test]
    fn sse_payload_preview_stays_valid_utf8() {
        let payload = format!(
            r#"{{"type":"content","content":"{}"}}"#,
            "ノード不足 ".repeat(40)
        );
        let preview = log_preview(&payload, 200);
        assert!(preview.len() <= 200 + PREVIEW_ELLIPSIS.len());
        assert!(preview.ends_with(PREVIEW_ELLIPSIS));
        assert!(preview.starts_with(r#"{"type":"content""#));
    }

    #[test]
    fn zero_budget_yields_only_marker() {
        assert_eq!(log_preview("pods", 0), PREVIEW_ELLIPSIS);
        assert_eq!(log_preview("", 0), "");
    }
}
