use quick_xml::events::BytesStart;

use super::numbering::Indentation;

pub fn attr_string(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| std::str::from_utf8(&attr.value).ok().map(str::to_string))
}

pub fn attr_u32(e: &BytesStart<'_>, key: &[u8]) -> Option<u32> {
    attr_string(e, key).and_then(|value| value.trim().parse::<u32>().ok())
}

pub fn attr_i32(e: &BytesStart<'_>, key: &[u8]) -> Option<i32> {
    attr_string(e, key).and_then(|value| value.trim().parse::<i32>().ok())
}

pub fn read_indentation(e: &BytesStart<'_>) -> Indentation {
    Indentation {
        left: attr_i32(e, b"w:left").or_else(|| attr_i32(e, b"w:start")),
        hanging: attr_i32(e, b"w:hanging"),
        first_line: attr_i32(e, b"w:firstLine"),
    }
}

pub fn escape_text(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}
