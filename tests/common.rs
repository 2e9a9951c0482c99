#![cfg(feature = "std")]

use std::path::Path;

use csv::ReaderBuilder;
use sextant::{
    avec::{
        FromSentence, FromSentences, RecordFactory, Sentence,
        reader::{NmeaStream, TmqStream},
    },
    sans::classify::{Dialect, TypeCode},
};

const GPS: &str = "fixtures/small.gps";
const TMQ: &str = "fixtures/small.tmq";

const MQA: [&[u8]; 2] = [
    b"$PTMQA,\x01\x02$M\x08\x05\x91\x02$M\x00*E8",
    b"$PTMQA,\x01\x02*M\x08\x05\\\x02*M\x00*76",
];

#[test]
fn decode_slice_standard() {
    let data = std::fs::read(GPS).unwrap();
    let mut validator = Validator::new(GPS);
    sextant::avec::decode_slice(&data, Dialect::Standard, &mut validator).unwrap();
    validator.finish();
}

#[test]
fn decode_reader_standard() {
    let mut file = std::fs::File::open(GPS).unwrap();
    let mut validator = Validator::new(GPS);
    sextant::avec::decode_reader(&mut file, Dialect::Standard, &mut validator).unwrap();
    validator.finish();
}

#[test]
fn read_standard_from_file() {
    let file = std::fs::File::open(GPS).unwrap();
    let mut stream = NmeaStream::from_reader(file).with_block_size(64);

    let mut frames = Vec::new();
    loop {
        let next = stream.read().unwrap();
        if next.is_empty() {
            break;
        }
        frames.extend(next);
    }

    let expected: Vec<String> = expected(GPS).into_iter().map(|r| r[1].clone()).collect();
    assert_eq!(frames, expected);

    // Polling after the end keeps returning nothing.
    assert!(stream.read().unwrap().is_empty());
    assert!(stream.get_strings(Some("")).unwrap().is_empty());
}

#[test]
fn standard_objects_from_file() {
    let file = std::fs::File::open(GPS).unwrap();
    let mut stream = NmeaStream::from_reader(file);
    let mut factory = RecordFactory::<Sentence>::new();

    let types: Vec<&str> = stream
        .get_objects(None, &mut factory)
        .unwrap()
        .into_iter()
        .map(|r| r.unwrap().sen_type().unwrap())
        .collect();

    assert_eq!(types, [
        "RMC", "GGA", "RMC", "GGA", "GLL", "VTG", "RMC", "GGA", "GLL", "VTG"
    ]);
}

#[test]
fn read_tmq_from_file() {
    let file = std::fs::File::open(TMQ).unwrap();
    let mut stream = TmqStream::from_reader(file).with_block_size(16);

    let mut frames = Vec::new();
    loop {
        let next = stream.read().unwrap();
        if next.is_empty() {
            break;
        }
        frames.extend(next);
    }

    assert_eq!(frames, MQA);
}

#[test]
fn tmq_objects_from_data() {
    let data = std::fs::read(TMQ).unwrap();
    let mut stream = TmqStream::new();
    let mut factory = RecordFactory::<Sentence>::new();

    let objects = stream.get_objects(Some(&data[..]), &mut factory).unwrap();

    assert_eq!(objects.len(), 2);
    for object in objects {
        assert_eq!(object.unwrap().sen_type(), Some("MQA"));
    }

    assert_eq!(stream.get_strings(Some(&b""[..])).unwrap(), Vec::<Vec<u8>>::new());
}

#[test]
fn decode_slice_tmq() {
    let data = std::fs::read(TMQ).unwrap();
    let mut payloads = Payloads::default();
    sextant::avec::decode_slice(&data, Dialect::Tmq, &mut payloads).unwrap();

    assert_eq!(payloads.0.len(), 2);
    assert_eq!(payloads.0[0].fields, [b"\x01\x02$M\x08\x05\x91\x02$M\x00".to_vec()]);
}

#[test]
fn decode_standard_as_tmq() {
    // No anchor anywhere, but the document is too short to give up on.
    let data = std::fs::read(GPS).unwrap();
    let mut payloads = Payloads::default();
    sextant::avec::decode_slice(&data, Dialect::Tmq, &mut payloads).unwrap();

    assert!(payloads.0.is_empty());
}

#[derive(Default)]
struct Payloads(Vec<Sentence>);

impl FromSentences for Payloads {
    fn add_sentence(&mut self, _: TypeCode) -> Option<&mut dyn FromSentence> {
        self.0.push(Sentence::default());
        self.0.last_mut().map(|r| r as _)
    }
}

/// Expected rows of a fixture: sentence code, then the frame.
fn expected(path: impl AsRef<Path>) -> Vec<Vec<String>> {
    let path = path.as_ref().with_extension("csv");

    let mut reader = ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)
        .unwrap();

    reader
        .records()
        .map(|r| r.unwrap().iter().map(|f| f.to_string()).collect())
        .collect()
}

struct Validator(Vec<String>, Vec<Vec<String>>);

impl Validator {
    fn new(path: impl AsRef<Path>) -> Self {
        Self(vec![], expected(path))
    }

    fn finish(&self) {
        assert!(self.0.is_empty());
        assert!(self.1.is_empty());
    }
}

impl FromSentences for Validator {
    fn add_sentence(&mut self, code: TypeCode) -> Option<&mut dyn FromSentence> {
        assert!(self.0.is_empty());

        let mut row = self.1.remove(0);
        assert_eq!(row.remove(0), code.as_str());

        let frame = row.remove(0);
        let (_, body) = frame.split_once(',').unwrap();
        let (body, _) = body.rsplit_once('*').unwrap();
        self.0 = body.split(',').map(String::from).collect();

        Some(self)
    }
}

impl FromSentence for Validator {
    fn set_type(&mut self, code: TypeCode) {
        assert_eq!(code.dialect(), Dialect::Standard);
    }

    fn add_field(&mut self, _: u8, value: &[u8]) {
        assert_eq!(self.0.remove(0).as_bytes(), value);
    }
}
