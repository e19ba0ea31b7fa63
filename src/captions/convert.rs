/// SRT/VTT caption text reduced to a plain transcript: cue indices,
/// timestamps, header/metadata blocks, and inline markup are dropped, and
/// consecutive duplicate lines (rolling captions) are collapsed.
pub fn transcript_from_captions(content: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut in_metadata_block = false;
    for raw in content.lines() {
        let line = raw.trim().trim_start_matches('\u{feff}').trim();
        if line.is_empty() {
            in_metadata_block = false;
            continue;
        }
        if line.starts_with("WEBVTT") || line.starts_with("NOTE") || line.starts_with("STYLE") {
            in_metadata_block = true;
            continue;
        }
        if in_metadata_block {
            continue;
        }
        if line.contains("-->") || is_cue_index(line) {
            continue;
        }
        let text = strip_markup(line);
        if text.is_empty() {
            continue;
        }
        if lines.last().map(|prev| prev == &text).unwrap_or(false) {
            continue;
        }
        lines.push(text);
    }
    lines.join("\n")
}

fn is_cue_index(line: &str) -> bool {
    !line.is_empty() && line.chars().all(|c| c.is_ascii_digit())
}

/// Remove `<i>`, `<00:00:01.000>`, speaker voice tags and the like.
fn strip_markup(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut depth = 0u32;
    for c in line.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srt_becomes_plain_text() {
        let srt = "1\n00:00:01,000 --> 00:00:04,000\nHello and welcome.\n\n2\n00:00:04,000 --> 00:00:08,000\nToday we cover ownership.\n";
        assert_eq!(
            transcript_from_captions(srt),
            "Hello and welcome.\nToday we cover ownership."
        );
    }

    #[test]
    fn vtt_header_and_cue_settings_are_dropped() {
        let vtt = "WEBVTT\nKind: captions\nLanguage: en\n\n00:01.000 --> 00:04.000 align:start\n<v Speaker>Hello</v> there\n";
        assert_eq!(transcript_from_captions(vtt), "Hello there");
    }

    #[test]
    fn rolling_duplicates_collapse() {
        let srt = "1\n00:00:01,000 --> 00:00:02,000\nsame line\n\n2\n00:00:02,000 --> 00:00:03,000\nsame line\n\n3\n00:00:03,000 --> 00:00:04,000\nnew line\n";
        assert_eq!(transcript_from_captions(srt), "same line\nnew line");
    }

    #[test]
    fn empty_input_yields_empty_transcript() {
        assert_eq!(transcript_from_captions(""), "");
        assert_eq!(transcript_from_captions("WEBVTT\n\n"), "");
    }
}
