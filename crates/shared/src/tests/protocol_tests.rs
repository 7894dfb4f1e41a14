use super::*;

#[test]
fn keep_alive_frame_matches_wire_shape() {
    let text = serde_json::to_string(&OutboundFrame::Ping).expect("serialize");
    assert_eq!(text, r#"{"type":"ping"}"#);
}

#[test]
fn missing_data_yields_empty_first_page() {
    let pages: ApiPages = serde_json::from_str("{}").expect("decode");
    assert!(pages.into_first_page().is_empty());
}

#[test]
fn only_first_page_is_kept() {
    let pages: ApiPages =
        serde_json::from_str(r#"{"data":[[{"a":1},{"a":2}],[{"a":3}]]}"#).expect("decode");
    let first = pages.into_first_page();
    assert_eq!(first.len(), 2);
    assert_eq!(first[0]["a"], 1);
}

#[test]
fn result_set_header_after_rows_is_ignored() {
    let pages: ApiPages = serde_json::from_str(
        r#"{"data":[[{"status_texto":"e1"},{"status_texto":"e2"}],{"fieldCount":0,"affectedRows":0}]}"#,
    )
    .expect("decode");
    let first = pages.into_first_page();
    assert_eq!(first.len(), 2);
    assert_eq!(first[1]["status_texto"], "e2");
}

#[test]
fn non_array_first_element_is_an_empty_page() {
    let pages: ApiPages = serde_json::from_str(r#"{"data":[{"fieldCount":0}]}"#).expect("decode");
    assert!(pages.into_first_page().is_empty());
}
