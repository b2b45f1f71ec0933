//! Loading of reconstructed events from plain-text records
//!
//! Each event starts with an `event` record, which is followed by exactly one
//! `met` record and any number of `lepton` and `jet` records:
//!
//! ```text
//! event  <sf> <weight> <vxp_z> <n_vtx> <trig_e> <trig_mu> <grl> <good_vtx>
//! met    <et> <phi>
//! lepton <pt> <eta> <phi> <e> <charge> <type> <tight> <ptconerel30> <etconerel20> <z0> <d0>
//! jet    <pt> <eta> <phi> <e> <mv2c10> <jvt>
//! ```
//!
//! Flags are written `1` or `0`, and event flags may be `-` when unknown.
//! Blank lines and `#` comments are ignored.

use crate::{
    event::{Event, EventInfo, Jet, Lepton, MissingEt},
    momentum::from_pt_eta_phi_e,
    numeric::Float,
};

use log::debug;
use std::{
    fs,
    path::{Path, PathBuf},
    str::{FromStr, SplitWhitespace},
};
use thiserror::Error;

/// Failure to load events
#[derive(Debug, Error)]
pub enum ReadError {
    /// The event file could not be read
    #[error("could not read events from {path}")]
    Io {
        /// Path to the event file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A record could not be decoded
    #[error("line {line}: {message}")]
    Syntax {
        /// Line number, starting at 1
        line: usize,
        /// What went wrong
        message: String,
    },

    /// An event ended without its missing-ET record
    #[error("line {line}: event has no met record")]
    MissingMet {
        /// Line of the event record
        line: usize,
    },

    /// An object record appeared before the first event record
    #[error("line {line}: {record} record does not belong to any event")]
    OrphanRecord {
        /// Line of the object record
        line: usize,
        /// Kind of object record
        record: &'static str,
    },
}

/// Read events from a file
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<Event>, ReadError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_owned(),
        source,
    })?;
    let events = parse_events(&contents)?;
    debug!("Read {} events from {}", events.len(), path.display());
    Ok(events)
}

/// Decode events from their textual representation
pub fn parse_events(input: &str) -> Result<Vec<Event>, ReadError> {
    let mut events = Vec::new();
    let mut current: Option<EventBuilder> = None;

    for (idx, line) in input.lines().enumerate() {
        let line_number = idx + 1;
        let content = line.split('#').next().unwrap_or_default();
        let mut words = content.split_whitespace();
        let Some(record) = words.next() else {
            continue;
        };

        match record {
            "event" => {
                let mut fields = Fields::new(line_number, words);
                let info = EventInfo {
                    scale_factor: fields.number("scale factor")?,
                    event_weight: fields.number("event weight")?,
                    primary_vertex_z: fields.number("primary vertex z")?,
                    num_vertices: fields.number("vertex count")?,
                    triggered_by_electron: fields.optional_flag("electron trigger")?,
                    triggered_by_muon: fields.optional_flag("muon trigger")?,
                    pass_grl: fields.optional_flag("good-run list")?,
                    has_good_vertex: fields.optional_flag("good vertex")?,
                };
                fields.finish()?;
                if let Some(previous) = current.replace(EventBuilder::new(line_number, info)) {
                    events.push(previous.build()?);
                }
            }

            "met" => {
                let mut fields = Fields::new(line_number, words);
                let et_miss = MissingEt {
                    et: fields.number("et")?,
                    phi: fields.number("phi")?,
                };
                fields.finish()?;
                let builder = current_event(&mut current, line_number, "met")?;
                if builder.et_miss.replace(et_miss).is_some() {
                    return Err(ReadError::Syntax {
                        line: line_number,
                        message: "duplicate met record".to_owned(),
                    });
                }
            }

            "lepton" => {
                let mut fields = Fields::new(line_number, words);
                let (pt, eta, phi, e) = fields.four_momentum()?;
                let lepton = Lepton {
                    p4: from_pt_eta_phi_e(pt, eta, phi, e),
                    charge: fields.number("charge")?,
                    pdg_id: fields.number("type")?,
                    tight_id: fields.flag("tight")?,
                    ptconerel30: fields.number("ptconerel30")?,
                    etconerel20: fields.number("etconerel20")?,
                    z0: fields.number("z0")?,
                    d0: fields.number("d0")?,
                };
                fields.finish()?;
                current_event(&mut current, line_number, "lepton")?
                    .leptons
                    .push(lepton);
            }

            "jet" => {
                let mut fields = Fields::new(line_number, words);
                let (pt, eta, phi, e) = fields.four_momentum()?;
                let jet = Jet {
                    p4: from_pt_eta_phi_e(pt, eta, phi, e),
                    mv2c10: fields.number("mv2c10")?,
                    jvt: fields.number("jvt")?,
                };
                fields.finish()?;
                current_event(&mut current, line_number, "jet")?
                    .jets
                    .push(jet);
            }

            other => {
                return Err(ReadError::Syntax {
                    line: line_number,
                    message: format!("unknown record type {:?}", other),
                })
            }
        }
    }

    if let Some(last) = current {
        events.push(last.build()?);
    }
    Ok(events)
}

/// Event which is being read
struct EventBuilder {
    line: usize,
    info: EventInfo,
    et_miss: Option<MissingEt>,
    leptons: Vec<Lepton>,
    jets: Vec<Jet>,
}
//
impl EventBuilder {
    fn new(line: usize, info: EventInfo) -> Self {
        Self {
            line,
            info,
            et_miss: None,
            leptons: Vec::new(),
            jets: Vec::new(),
        }
    }

    fn build(self) -> Result<Event, ReadError> {
        Ok(Event {
            info: self.info,
            et_miss: self.et_miss.ok_or(ReadError::MissingMet { line: self.line })?,
            leptons: self.leptons,
            jets: self.jets,
        })
    }
}

/// Event which an object record belongs to
fn current_event<'a>(
    current: &'a mut Option<EventBuilder>,
    line: usize,
    record: &'static str,
) -> Result<&'a mut EventBuilder, ReadError> {
    current
        .as_mut()
        .ok_or(ReadError::OrphanRecord { line, record })
}

/// Fields of a record, decoded in order
struct Fields<'a> {
    line: usize,
    words: SplitWhitespace<'a>,
}
//
impl<'a> Fields<'a> {
    fn new(line: usize, words: SplitWhitespace<'a>) -> Self {
        Self { line, words }
    }

    fn syntax_error(&self, message: String) -> ReadError {
        ReadError::Syntax {
            line: self.line,
            message,
        }
    }

    fn next_word(&mut self, name: &str) -> Result<&'a str, ReadError> {
        self.words
            .next()
            .ok_or_else(|| self.syntax_error(format!("missing {}", name)))
    }

    fn number<T: FromStr>(&mut self, name: &str) -> Result<T, ReadError> {
        let word = self.next_word(name)?;
        word.parse::<T>()
            .map_err(|_| self.syntax_error(format!("invalid {} {:?}", name, word)))
    }

    fn optional_flag(&mut self, name: &str) -> Result<Option<bool>, ReadError> {
        match self.next_word(name)? {
            "1" => Ok(Some(true)),
            "0" => Ok(Some(false)),
            "-" => Ok(None),
            word => Err(self.syntax_error(format!("invalid {} flag {:?}", name, word))),
        }
    }

    fn flag(&mut self, name: &str) -> Result<bool, ReadError> {
        self.optional_flag(name)?
            .ok_or_else(|| self.syntax_error(format!("{} flag must be known", name)))
    }

    fn four_momentum(&mut self) -> Result<(Float, Float, Float, Float), ReadError> {
        Ok((
            self.number("pt")?,
            self.number("eta")?,
            self.number("phi")?,
            self.number("e")?,
        ))
    }

    fn finish(mut self) -> Result<(), ReadError> {
        match self.words.next() {
            None => Ok(()),
            Some(word) => Err(self.syntax_error(format!("unexpected field {:?}", word))),
        }
    }
}
