//! Stage identities, artifacts and the stage plan.

use std::collections::HashMap;
use std::fmt;

use bytes::Bytes;

use crate::fingerprint::fingerprint;
use crate::format::{FontFormat, FormatSet};

/// One step of the font build, named after the format it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    Svg,
    Ttf,
    Woff,
    Woff2,
    Eot,
}

impl Stage {
    /// The stage producing `format`.
    pub fn for_format(format: FontFormat) -> Self {
        match format {
            FontFormat::Svg => Stage::Svg,
            FontFormat::Ttf => Stage::Ttf,
            FontFormat::Woff => Stage::Woff,
            FontFormat::Woff2 => Stage::Woff2,
            FontFormat::Eot => Stage::Eot,
        }
    }

    /// The format this stage produces.
    pub fn format(&self) -> FontFormat {
        match self {
            Stage::Svg => FontFormat::Svg,
            Stage::Ttf => FontFormat::Ttf,
            Stage::Woff => FontFormat::Woff,
            Stage::Woff2 => FontFormat::Woff2,
            Stage::Eot => FontFormat::Eot,
        }
    }

    /// The stage whose artifact feeds this one. The SVG stage reads the
    /// glyph sources directly.
    pub fn input(&self) -> Option<Stage> {
        match self {
            Stage::Svg => None,
            Stage::Ttf => Some(Stage::Svg),
            Stage::Woff | Stage::Woff2 | Stage::Eot => Some(Stage::Ttf),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// What a stage handed to its dependents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageArtifact {
    /// Nothing was regenerated; the previous output on disk is current.
    Unchanged,
    /// Freshly encoded font data.
    Produced(Bytes),
}

impl StageArtifact {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, StageArtifact::Unchanged)
    }

    /// The produced buffer, if any.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            StageArtifact::Unchanged => None,
            StageArtifact::Produced(bytes) => Some(bytes),
        }
    }

    /// CRC-32 fingerprint of the produced buffer.
    pub fn fingerprint(&self) -> Option<String> {
        self.bytes().map(|bytes| fingerprint(bytes))
    }
}

/// Artifacts of the stages that have finished so far.
///
/// Only the executor inserts, and only after a whole group has completed,
/// so a stage never observes a sibling's output.
#[derive(Debug, Clone, Default)]
pub struct StageOutputs {
    artifacts: HashMap<Stage, StageArtifact>,
}

impl StageOutputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, stage: Stage, artifact: StageArtifact) {
        self.artifacts.insert(stage, artifact);
    }

    pub fn get(&self, stage: Stage) -> Option<&StageArtifact> {
        self.artifacts.get(&stage)
    }

    pub fn contains(&self, stage: Stage) -> bool {
        self.artifacts.contains_key(&stage)
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }
}

/// Ordered groups of stages. Stages within a group run concurrently; groups
/// run one after another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagePlan {
    groups: Vec<Vec<Stage>>,
}

impl StagePlan {
    /// Plans the stages needed to produce `formats`.
    ///
    /// The SVG stage always runs since it feeds the fingerprint. The TTF
    /// stage runs whenever TTF or a TTF-derived format is requested, even if
    /// the TTF file itself is not written.
    pub fn for_request(formats: &FormatSet) -> Self {
        let mut groups = vec![vec![Stage::Svg]];

        if formats.needs_ttf() {
            groups.push(vec![Stage::Ttf]);

            let derived: Vec<Stage> = formats
                .iter()
                .filter(FontFormat::is_derived_from_ttf)
                .map(Stage::for_format)
                .collect();
            if !derived.is_empty() {
                groups.push(derived);
            }
        }

        Self { groups }
    }

    pub fn groups(&self) -> &[Vec<Stage>] {
        &self.groups
    }

    /// Every planned stage in execution order.
    pub fn stages(&self) -> impl Iterator<Item = Stage> + '_ {
        self.groups.iter().flatten().copied()
    }
}
