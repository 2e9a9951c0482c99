//! Mapping frames to sentence types.
//!
//! Both dialects open a sentence with a five-character token: a two-character
//! talker followed by a three-character code (`GPRMC`, `PTMQA`). The code
//! selects the record shape. Each dialect has its own table of codes, and a
//! token of one dialect is refused by the other rather than matched by
//! accident.

use alloc::string::{String, ToString};
use core::fmt;

use thiserror::Error;
use zerocopy::FromBytes;

/// A framing dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    /// Line-delimited ASCII sentences.
    Standard,
    /// `$PTMQ` sentences with binary payloads.
    Tmq,
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Standard => "standard",
            Self::Tmq => "TMQ",
        })
    }
}

/// An error classifying a frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// No sentence type of the dialect matches the token.
    #[error("Unknown {dialect} sentence type ({token}).")]
    UnknownSentenceType { dialect: Dialect, token: String },
    /// The frame belongs to the other dialect.
    #[error("Found {found} sentence ({token}) where {expected} was expected.")]
    WrongDialect {
        expected: Dialect,
        found: Dialect,
        token: String,
    },
}

macro_rules! sentence_types {
    ($(#[$attr:meta])* $name:ident { $($variant:ident = $code:literal,)* }) => {
        $(#[$attr])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(#[doc = concat!("`", $code, "`")] $variant,)*
        }

        impl $name {
            /// Look up a three-character sentence code.
            pub fn from_code(code: &[u8]) -> Option<Self> {
                $(if code == $code.as_bytes() {
                    return Some(Self::$variant);
                })*

                None
            }

            /// The three-character sentence code.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $code,)*
                }
            }
        }
    };
}

sentence_types!(
    /// Sentence types of the standard dialect.
    SentenceType {
        Alm = "ALM",
        Apa = "APA",
        Apb = "APB",
        Bec = "BEC",
        Bod = "BOD",
        Bwc = "BWC",
        Bwr = "BWR",
        Bww = "BWW",
        Dbt = "DBT",
        Dpt = "DPT",
        Gga = "GGA",
        Gll = "GLL",
        Gsa = "GSA",
        Gst = "GST",
        Gsv = "GSV",
        Gtd = "GTD",
        Gxa = "GXA",
        Hdg = "HDG",
        Hdt = "HDT",
        Msk = "MSK",
        Mss = "MSS",
        Mwv = "MWV",
        R00 = "R00",
        Rma = "RMA",
        Rmb = "RMB",
        Rmc = "RMC",
        Rte = "RTE",
        Stn = "STN",
        Trf = "TRF",
        Txt = "TXT",
        Vbw = "VBW",
        Vtg = "VTG",
        Vwr = "VWR",
        Wcv = "WCV",
        Wnc = "WNC",
        Wpl = "WPL",
        Xte = "XTE",
        Xtr = "XTR",
        Zda = "ZDA",
        Zfo = "ZFO",
        Ztg = "ZTG",
    }
);

sentence_types!(
    /// Sentence types of the TMQ dialect.
    TmqType {
        Mqa = "MQA",
    }
);

/// A classified sentence type, selecting the record to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeCode {
    Standard(SentenceType),
    Tmq(TmqType),
}

impl TypeCode {
    pub fn dialect(&self) -> Dialect {
        match self {
            Self::Standard(_) => Dialect::Standard,
            Self::Tmq(_) => Dialect::Tmq,
        }
    }

    /// The three-character sentence code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard(t) => t.as_str(),
            Self::Tmq(t) => t.as_str(),
        }
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[repr(C)]
#[derive(Debug, FromBytes)]
struct Token {
    talker: [u8; 2],
    code: [u8; 3],
}

impl Token {
    /// Read the token opening a frame, with or without its `$`.
    fn parse(frame: &[u8]) -> Option<Self> {
        let frame = frame.strip_prefix(b"$").unwrap_or(frame);
        let r: [u8; 5] = frame.get(..5)?.try_into().ok()?;

        if !matches!(frame.get(5), None | Some(b',' | b'*' | b'\r' | b'\n')) {
            return None;
        }

        let token: Self = zerocopy::transmute!(r);
        Some(token)
    }

    fn is_tmq(&self) -> bool {
        &self.talker == b"PT" && self.code.starts_with(b"MQ")
    }

    fn is_standard(&self) -> bool {
        !self.is_tmq() && self.talker.iter().chain(&self.code).all(u8::is_ascii_alphanumeric)
    }
}

/// Classify a frame under `dialect`.
///
/// Frames are accepted with or without their leading `$`.
pub fn classify(frame: &[u8], dialect: Dialect) -> Result<TypeCode, ClassifyError> {
    let token = Token::parse(frame);

    let found = match &token {
        Some(t) if t.is_tmq() => Some(Dialect::Tmq),
        Some(t) if t.is_standard() => Some(Dialect::Standard),
        _ => None,
    };

    if let Some(found) = found.filter(|&found| found != dialect) {
        Err(ClassifyError::WrongDialect {
            expected: dialect,
            found,
            token: describe(frame),
        })?;
    }

    // Only a well-formed token of the requested dialect is looked up.
    let code = token
        .as_ref()
        .filter(|_| found == Some(dialect))
        .map(|t| &t.code[..]);

    let code = match dialect {
        Dialect::Standard => code
            .and_then(SentenceType::from_code)
            .map(TypeCode::Standard),
        Dialect::Tmq => code.and_then(TmqType::from_code).map(TypeCode::Tmq),
    };

    code.ok_or_else(|| ClassifyError::UnknownSentenceType {
        dialect,
        token: describe(frame),
    })
}

/// A printable rendering of the token opening `frame`, for errors.
fn describe(frame: &[u8]) -> String {
    let frame = frame.strip_prefix(b"$").unwrap_or(frame);
    let end = frame
        .iter()
        .take(16)
        .position(|&b| b == b',' || b == b'*')
        .unwrap_or(frame.len().min(16));

    String::from_utf8_lossy(&frame[..end]).to_string()
}
