use proptest::prelude::*;
use sextant::sans::{
    split::{Separator, split},
    standard::StandardFramer,
    tmq::TmqFramer,
};

const GPS: &[u8] = include_bytes!("../fixtures/small.gps");
const TMQ: &[u8] = include_bytes!("../fixtures/small.tmq");

/// Cut `data` at the given points, clamped to valid offsets.
fn chunks(data: &[u8], mut cuts: Vec<usize>) -> Vec<&[u8]> {
    cuts.iter_mut().for_each(|c| *c %= data.len() + 1);
    cuts.sort_unstable();

    let mut start = 0;
    let mut chunks = Vec::new();

    for cut in cuts.into_iter().chain([data.len()]) {
        chunks.push(&data[start..cut]);
        start = cut;
    }

    chunks
}

fn frame_standard<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<String> {
    let mut framer = StandardFramer::new();
    let mut frames = Vec::new();

    for chunk in chunks {
        // Fixtures are ASCII, so any cut is a character boundary.
        frames.extend(framer.push(std::str::from_utf8(chunk).unwrap()));
    }

    frames.extend(framer.finish());
    frames
}

fn frame_tmq<'a>(chunks: impl IntoIterator<Item = &'a [u8]>) -> Vec<Vec<u8>> {
    let mut framer = TmqFramer::new();
    let mut frames = Vec::new();

    for chunk in chunks {
        frames.extend(framer.push(chunk).unwrap());
    }

    frames.extend(framer.finish());
    frames
}

#[test]
fn whole_fixtures() {
    assert_eq!(frame_standard([GPS]).len(), 10);
    assert_eq!(frame_tmq([TMQ]).len(), 2);
}

proptest! {
    #[test]
    fn standard_is_chunk_independent(cuts in prop::collection::vec(any::<usize>(), 0..32)) {
        let expected = frame_standard([GPS]);
        prop_assert_eq!(frame_standard(chunks(GPS, cuts)), expected);
    }

    #[test]
    fn tmq_is_chunk_independent(cuts in prop::collection::vec(any::<usize>(), 0..32)) {
        let expected = frame_tmq([TMQ]);
        prop_assert_eq!(frame_tmq(chunks(TMQ, cuts)), expected);
    }

    #[test]
    fn split_removes_line_endings(text in "[$A-Z0-9,*\r\n]{0,64}") {
        let frames = split(&text, &Separator::LineEnding);
        let lines = text.split(['\r', '\n']).filter(|l| !l.is_empty()).count();

        prop_assert_eq!(frames.len(), lines);
        for frame in frames {
            prop_assert!(!frame.contains(['\r', '\n']));
        }
    }

    #[test]
    fn split_with_custom_separator(fields in prop::collection::vec("[A-Z0-9,]{1,12}", 1..8)) {
        let separator = Separator::custom("NOTHING").unwrap();
        let text: String = fields.iter().map(|f| format!("${f}NOTHING")).collect();

        prop_assert_eq!(split(&text, &separator), fields);
    }
}
