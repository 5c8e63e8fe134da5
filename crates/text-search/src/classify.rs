use usagescope_api::UsageKind;

const IMPORT_PREFIXES: [&str; 5] = ["use ", "pub use ", "import ", "from ", "#include"];
const COMPOUND_ASSIGN: [&str; 10] = ["+=", "-=", "*=", "/=", "%=", "|=", "&=", "^=", "<<=", ">>="];

/// Guess how the match at byte range `start..end` of `line` uses the name.
pub fn classify(line: &str, start: usize, end: usize) -> UsageKind {
    let trimmed = line.trim_start();
    if is_comment_line(trimmed) || line[..start].contains("//") {
        return UsageKind::Comment;
    }
    if IMPORT_PREFIXES.iter().any(|p| trimmed.starts_with(p)) {
        return UsageKind::Import;
    }
    let rest = line[end..].trim_start();
    let plain_assign = rest.starts_with('=') && !rest.starts_with("==") && !rest.starts_with("=>");
    if plain_assign || COMPOUND_ASSIGN.iter().any(|op| rest.starts_with(op)) {
        return UsageKind::Write;
    }
    UsageKind::Read
}

fn is_comment_line(trimmed: &str) -> bool {
    if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*') {
        return true;
    }
    // shell/python comments, but not attributes, shebangs or includes
    trimmed.starts_with('#')
        && !trimmed.starts_with("#[")
        && !trimmed.starts_with("#!")
        && !trimmed.starts_with("#include")
}
