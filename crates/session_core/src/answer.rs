/// Display form of a raw answer string. Purely presentational; the
/// stored history always keeps the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormattedAnswer {
    /// Short answers are not decorated.
    Plain(String),
    /// One item per heuristic sentence, in original order.
    Bullets(Vec<String>),
}

/// Split an answer into readable points. The boundary is "period,
/// single space, uppercase letter"; answers with two or fewer
/// segments are returned verbatim.
pub fn format_answer(answer: &str) -> FormattedAnswer {
    let segments = split_segments(answer);
    if segments.len() <= 2 {
        return FormattedAnswer::Plain(answer.to_owned());
    }

    let bullets = segments
        .into_iter()
        .map(|segment| {
            if segment.ends_with('.') {
                segment
            } else {
                format!("{segment}.")
            }
        })
        .collect();
    FormattedAnswer::Bullets(bullets)
}

/// The period and space at a boundary are consumed; the uppercase
/// letter starts the next segment. Empty segments are dropped.
fn split_segments(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();

    let mut index = 0;
    while index < chars.len() {
        let c = chars[index];
        if c == '.'
            && index + 2 < chars.len()
            && chars[index + 1] == ' '
            && chars[index + 2].is_uppercase()
        {
            push_segment(&mut segments, &mut current);
            index += 2;
            continue;
        }
        current.push(c);
        index += 1;
    }
    push_segment(&mut segments, &mut current);

    segments
}

fn push_segment(segments: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        segments.push(trimmed.to_owned());
    }
    current.clear();
}
