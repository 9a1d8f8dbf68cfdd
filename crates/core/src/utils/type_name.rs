//! Helpers for qualified Java type names such as `java.util.Map<java.lang.String,java.lang.Integer>`.

/// Strip package prefixes from a type and its generic arguments.
///
/// Arguments that are themselves generic collapse to `...`, so
/// `java.util.List<java.util.List<java.lang.String>>` becomes `List<...>`.
pub fn short_type(type_name: &str) -> String {
    match (type_name.find('<'), type_name.rfind('>')) {
        (Some(start), Some(end)) if end > start => {
            let raw = simple_name(&type_name[..start]);
            let arguments = &type_name[start + 1..end];
            format!("{raw}<{}>", short_arguments(arguments))
        }
        _ => simple_name(type_name).to_string(),
    }
}

fn short_arguments(arguments: &str) -> String {
    let pieces: Vec<&str> = arguments.split(',').map(str::trim).collect();
    if pieces.iter().any(|piece| piece.contains('<')) {
        return "...".to_string();
    }
    pieces
        .into_iter()
        .map(simple_name)
        .collect::<Vec<_>>()
        .join(",")
}

/// Last dotted segment of a non-generic type name
pub fn simple_name(type_name: &str) -> &str {
    let type_name = type_name.trim();
    match type_name.rfind('.') {
        Some(index) => &type_name[index + 1..],
        None => type_name,
    }
}

/// The raw type with any generic arguments removed
pub fn erase_generics(type_name: &str) -> &str {
    match type_name.find('<') {
        Some(index) => &type_name[..index],
        None => type_name,
    }
}

/// Top-level generic arguments of a type, outer brackets removed
pub fn type_arguments(type_name: &str) -> Vec<&str> {
    let (Some(start), Some(end)) = (type_name.find('<'), type_name.rfind('>')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    let inner = &type_name[start + 1..end];
    let mut arguments = Vec::new();
    let mut depth = 0usize;
    let mut begin = 0;
    for (index, ch) in inner.char_indices() {
        match ch {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                arguments.push(inner[begin..index].trim());
                begin = index + 1;
            }
            _ => {}
        }
    }
    arguments.push(inner[begin..].trim());
    arguments.retain(|argument| !argument.is_empty());
    arguments
}

/// The class a report should link for a parameter type: the element type of a
/// single-argument container, the value type of a two-argument map, otherwise
/// the raw type.
pub fn link_target(type_name: &str) -> &str {
    let arguments = type_arguments(type_name);
    let chosen = match arguments.as_slice() {
        [element] => element,
        [_, value] => value,
        _ => type_name,
    };
    erase_generics(chosen).trim_end_matches("[]")
}
