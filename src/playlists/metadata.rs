use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

const PLAYLISTS_KEY: &str = "channelPlaylistsIds";

/// Category custom-metadata documents arrive percent-encoded from some
/// MediaSpace installs.
pub fn percent_decode(s: &str) -> String {
    percent_decode_str(s).decode_utf8_lossy().into_owned()
}

/// Playlist IDs stored under the `channelPlaylistsIds` detail of a category
/// metadata document.
pub fn extract_playlist_ids(xml: &str) -> Result<Vec<String>> {
    let xml = percent_decode(xml);
    let mut reader = Reader::from_str(&xml);
    let mut pending_key: Option<String> = None;
    let mut current_element: Option<String> = None;
    loop {
        match reader.read_event().context("parsing metadata XML")? {
            Event::Start(e) => {
                current_element =
                    Some(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Event::Text(t) => {
                let text = t.unescape().context("unescaping metadata XML text")?.into_owned();
                match current_element.as_deref() {
                    Some("Key") => pending_key = Some(text.trim().to_string()),
                    Some("Value") if pending_key.as_deref() == Some(PLAYLISTS_KEY) => {
                        return Ok(split_ids(&text));
                    }
                    _ => {}
                }
            }
            Event::End(_) => current_element = None,
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(Vec::new())
}

/// Merge `new_ids` into the `channelPlaylistsIds` detail, preserving existing
/// order and appending only unseen IDs. A document without that detail gets
/// one appended before the root closes.
pub fn merge_playlist_ids(xml: &str, new_ids: &[String]) -> Result<String> {
    let xml = percent_decode(xml);
    let mut reader = Reader::from_str(&xml);
    let mut writer = Writer::new(Vec::new());

    let mut depth = 0usize;
    let mut pending_key: Option<String> = None;
    let mut current_element: Option<String> = None;
    let mut in_target_value = false;
    let mut value_rewritten = false;
    let mut found = false;

    loop {
        let event = reader.read_event().context("parsing metadata XML")?;
        match event {
            Event::Start(e) => {
                depth += 1;
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "Value" && pending_key.as_deref() == Some(PLAYLISTS_KEY) && !found {
                    in_target_value = true;
                    value_rewritten = false;
                    found = true;
                }
                current_element = Some(name);
                writer.write_event(Event::Start(e))?;
            }
            Event::Text(t) => {
                if in_target_value {
                    let current = t.unescape().context("unescaping metadata XML text")?;
                    let merged = merged_ids(&current, new_ids);
                    writer.write_event(Event::Text(BytesText::new(&merged)))?;
                    value_rewritten = true;
                } else {
                    if current_element.as_deref() == Some("Key") {
                        let text =
                            t.unescape().context("unescaping metadata XML text")?.into_owned();
                        pending_key = Some(text.trim().to_string());
                    }
                    writer.write_event(Event::Text(t))?;
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if in_target_value && name == "Value" {
                    if !value_rewritten {
                        // the Value element was empty
                        let merged = merged_ids("", new_ids);
                        writer.write_event(Event::Text(BytesText::new(&merged)))?;
                    }
                    in_target_value = false;
                }
                if depth == 1 && !found {
                    write_playlists_detail(&mut writer, new_ids)?;
                    found = true;
                }
                depth -= 1;
                current_element = None;
                writer.write_event(Event::End(e))?;
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "Value" && pending_key.as_deref() == Some(PLAYLISTS_KEY) && !found {
                    found = true;
                    writer.write_event(Event::Start(BytesStart::new("Value")))?;
                    writer.write_event(Event::Text(BytesText::new(&merged_ids("", new_ids))))?;
                    writer.write_event(Event::End(BytesEnd::new("Value")))?;
                } else {
                    writer.write_event(Event::Empty(e))?;
                }
            }
            Event::Eof => break,
            other => writer.write_event(other)?,
        }
    }

    String::from_utf8(writer.into_inner()).context("metadata XML is not valid UTF-8")
}

fn write_playlists_detail(writer: &mut Writer<Vec<u8>>, new_ids: &[String]) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("Detail")))?;
    writer.write_event(Event::Start(BytesStart::new("Key")))?;
    writer.write_event(Event::Text(BytesText::new(PLAYLISTS_KEY)))?;
    writer.write_event(Event::End(BytesEnd::new("Key")))?;
    writer.write_event(Event::Start(BytesStart::new("Value")))?;
    writer.write_event(Event::Text(BytesText::new(&new_ids.join(","))))?;
    writer.write_event(Event::End(BytesEnd::new("Value")))?;
    writer.write_event(Event::End(BytesEnd::new("Detail")))?;
    Ok(())
}

fn merged_ids(current: &str, new_ids: &[String]) -> String {
    let mut ids = split_ids(current);
    for id in new_ids {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.clone());
        }
    }
    ids.join(",")
}

fn split_ids(raw: &str) -> Vec<String> {
    raw.split(',').map(|p| p.trim().to_string()).filter(|p| !p.is_empty()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "<metadata><Detail><Key>channelPlaylistsIds</Key><Value>1_aaa,1_bbb</Value></Detail></metadata>";

    #[test]
    fn extracts_ids_from_the_detail() {
        assert_eq!(extract_playlist_ids(DOC).unwrap(), vec!["1_aaa", "1_bbb"]);
    }

    #[test]
    fn extracts_nothing_when_detail_is_absent() {
        let doc = "<metadata><Detail><Key>other</Key><Value>x</Value></Detail></metadata>";
        assert!(extract_playlist_ids(doc).unwrap().is_empty());
    }

    #[test]
    fn merge_appends_only_unseen_ids_in_order() {
        let merged =
            merge_playlist_ids(DOC, &["1_bbb".to_string(), "1_ccc".to_string()]).unwrap();
        assert!(merged.contains("<Value>1_aaa,1_bbb,1_ccc</Value>"));
    }

    #[test]
    fn merge_fills_an_empty_value() {
        let doc = "<metadata><Detail><Key>channelPlaylistsIds</Key><Value></Value></Detail></metadata>";
        let merged = merge_playlist_ids(doc, &["1_zzz".to_string()]).unwrap();
        assert!(merged.contains("<Value>1_zzz</Value>"));
    }

    #[test]
    fn merge_adds_the_detail_when_missing() {
        let doc = "<metadata><Detail><Key>other</Key><Value>x</Value></Detail></metadata>";
        let merged = merge_playlist_ids(doc, &["1_zzz".to_string()]).unwrap();
        assert!(merged.contains("<Key>channelPlaylistsIds</Key>"));
        assert!(merged.contains("<Value>1_zzz</Value>"));
        assert!(merged.contains("<Key>other</Key>"));
    }

    #[test]
    fn percent_decode_leaves_plus_alone() {
        assert_eq!(percent_decode("a%2Cb+c"), "a,b+c");
    }

    #[test]
    fn percent_encoded_documents_decode_first() {
        let doc = "%3Cmetadata%3E%3CDetail%3E%3CKey%3EchannelPlaylistsIds%3C%2FKey%3E%3CValue%3E1_aaa%3C%2FValue%3E%3C%2FDetail%3E%3C%2Fmetadata%3E";
        assert_eq!(extract_playlist_ids(doc).unwrap(), vec!["1_aaa"]);
    }
}
