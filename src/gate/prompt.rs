pub(crate) fn enroll_prompt(rp_id: &str, display: &str) -> String {
    format!(
        "Enroll security key\n\nStore: {rp_id}\nSecret: {display}\n\nPress Confirm to enroll, or Deny to abort."
    )
}

pub(crate) fn verify_prompt(rp_id: &str, display: &str) -> String {
    format!(
        "Release secret\n\nStore: {rp_id}\nSecret: {display}\n\nPress Confirm to release, or Deny to refuse."
    )
}
