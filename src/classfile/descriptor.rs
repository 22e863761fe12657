//! JVM field and method descriptor parsing.
//!
//! Descriptors arrive as strings straight out of the constant pool
//! (`(Lx/Y;I)Lx/Z;`, `[[Ljava/lang/String;`, `J`). Every consumer in the
//! verifier goes through this module; nothing else re-parses descriptor
//! syntax.

/// Return type portion of a method descriptor, or `None` when the
/// descriptor is malformed.
pub fn return_type(method_descriptor: &str) -> Option<&str> {
    let close = method_descriptor.rfind(')')?;
    let ret = &method_descriptor[close + 1..];
    if ret.is_empty() {
        None
    } else {
        Some(ret)
    }
}

/// Parameter type descriptors of a method descriptor, in declaration order.
///
/// Returns `None` when the descriptor is not of the form `(...)...` or a
/// parameter is truncated.
pub fn parameter_types(method_descriptor: &str) -> Option<Vec<&str>> {
    let inner = method_descriptor
        .strip_prefix('(')
        .and_then(|rest| rest.split_once(')'))
        .map(|(params, _)| params)?;

    let mut types = Vec::new();
    let mut rest = inner;
    while !rest.is_empty() {
        let len = type_descriptor_length(rest)?;
        types.push(&rest[..len]);
        rest = &rest[len..];
    }
    Some(types)
}

/// Length in bytes of the first type descriptor in `s`.
fn type_descriptor_length(s: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let mut idx = 0;
    // Arbitrarily nested array markers precede the element type.
    while idx < bytes.len() && bytes[idx] == b'[' {
        idx += 1;
    }
    match bytes.get(idx)? {
        b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' => Some(idx + 1),
        b'L' => {
            let semi = s[idx..].find(';')?;
            Some(idx + semi + 1)
        }
        _ => None,
    }
}

/// Class name referenced by a type descriptor, if any.
///
/// Array descriptors resolve to their element type; primitive types (and
/// `V`) reference no class. Accepts both descriptor syntax
/// (`[Ljava/lang/String;`, `Lp/C;`) and the bare internal names that
/// `anewarray`/`checkcast` operands may carry (`p/C`).
pub fn extract_class_name(type_descriptor: &str) -> Option<&str> {
    let element = type_descriptor.trim_start_matches('[');
    if element.is_empty() {
        return None;
    }
    if let Some(object) = element.strip_prefix('L').and_then(|s| s.strip_suffix(';')) {
        return Some(object);
    }
    // Single-character primitives carry no class reference.
    if element.len() == 1 && "BCDFIJSZV".contains(element) {
        return None;
    }
    Some(element)
}

/// All class names referenced by a method descriptor (parameters and
/// return type). Used to check that the types a member mentions exist.
pub fn referenced_classes(method_descriptor: &str) -> Vec<&str> {
    let mut classes = Vec::new();
    if let Some(params) = parameter_types(method_descriptor) {
        for param in params {
            if let Some(name) = extract_class_name(param) {
                classes.push(name);
            }
        }
    }
    if let Some(ret) = return_type(method_descriptor) {
        if let Some(name) = extract_class_name(ret) {
            classes.push(name);
        }
    }
    classes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_types() {
        assert_eq!(return_type("()V"), Some("V"));
        assert_eq!(return_type("(II)Lx/Z;"), Some("Lx/Z;"));
        assert_eq!(return_type("()[[J"), Some("[[J"));
        assert_eq!(return_type("no-parens"), None);
        assert_eq!(return_type("()"), None);
    }

    #[test]
    fn parameter_lists() {
        assert_eq!(parameter_types("()V"), Some(vec![]));
        assert_eq!(
            parameter_types("(Lx/Y;I)Lx/Z;"),
            Some(vec!["Lx/Y;", "I"])
        );
        assert_eq!(
            parameter_types("([[Lx/Y;J[I)V"),
            Some(vec!["[[Lx/Y;", "J", "[I"])
        );
        assert_eq!(parameter_types("(IL)V"), None);
        assert_eq!(parameter_types("I"), None);
    }

    #[test]
    fn class_name_extraction() {
        assert_eq!(extract_class_name("Ljava/lang/String;"), Some("java/lang/String"));
        assert_eq!(extract_class_name("[[Ljava/lang/String;"), Some("java/lang/String"));
        assert_eq!(extract_class_name("[I"), None);
        assert_eq!(extract_class_name("J"), None);
        assert_eq!(extract_class_name("V"), None);
        // Bare internal names from type-op instruction operands.
        assert_eq!(extract_class_name("p/C"), Some("p/C"));
        assert_eq!(extract_class_name("[[J"), None);
    }

    #[test]
    fn descriptor_class_references() {
        assert_eq!(
            referenced_classes("(Lx/Y;[Lx/W;I)Lx/Z;"),
            vec!["x/Y", "x/W", "x/Z"]
        );
        assert!(referenced_classes("(IJ)V").is_empty());
    }
}
