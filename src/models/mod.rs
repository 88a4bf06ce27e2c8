//! Domain types returned by and sent to the synthesis service

pub mod action;
pub mod retrosynthesis;
pub mod synthesis;

pub use action::{Action, ActionContent, Parameter};
pub use retrosynthesis::{
    MoleculeDescriptor, PredictionStatus, Project, RetrosynthesisParameters,
    RetrosynthesisPath, RetrosynthesisPrediction,
};
pub use synthesis::{
    AnalysisReportRef, ExecutionStatus, ReactionEntry, SynthesisNode, SynthesisPlan,
};
