//! Validation Utilities

use validator::ValidationErrors;

use super::error::FrameError;

/// Convert validation errors to a FrameError naming the first offending field.
///
/// `wire_name` maps a struct field to the key clients actually send.
pub fn validation_error(
    errors: ValidationErrors,
    wire_name: impl Fn(&str) -> &str,
) -> FrameError {
    let mut fields: Vec<(String, String)> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            let field: &str = field;
            let name = wire_name(field).to_string();
            errs.iter().map(move |e| {
                let message = e
                    .message
                    .clone()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string());
                (name.clone(), message)
            })
        })
        .collect();

    // field_errors() is backed by a HashMap
    fields.sort();

    match fields.into_iter().next() {
        Some((field, message)) => FrameError::Invalid { field, message },
        None => FrameError::Invalid {
            field: "event".into(),
            message: "Validation failed".into(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use validator::ValidationError;

    #[test]
    fn test_reports_wire_name() {
        let mut errors = ValidationErrors::new();
        errors.add("room_id", ValidationError::new("length"));

        let err = validation_error(errors, |field| match field {
            "room_id" => "roomID",
            other => other,
        });

        match err {
            FrameError::Invalid { field, message } => {
                assert_eq!(field, "roomID");
                assert_eq!(message, "length");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
