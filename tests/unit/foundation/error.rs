use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        BratError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(BratError::render("x").to_string().contains("render error:"));
    assert!(BratError::encode("x").to_string().contains("encode error:"));
    assert!(
        BratError::generation("x")
            .to_string()
            .contains("generation failed:")
    );
    assert!(BratError::NoFrames.to_string().contains("no frames"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = BratError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn io_errors_convert_with_question_mark() {
    fn fails() -> BratResult<()> {
        Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(matches!(err, BratError::Io(_)));
    assert!(err.to_string().contains("gone"));
}

#[test]
fn only_validation_is_a_caller_error() {
    assert!(BratError::validation("empty").is_caller_error());
    assert!(!BratError::render("x").is_caller_error());
    assert!(!BratError::NoFrames.is_caller_error());
    assert!(!BratError::generation("x").is_caller_error());
}
