//! Message-passing resolver binding.
//!
//! Each question is sent as a [`Prompt`] carrying its own reply sender, so
//! any thread (a UI, an RPC handler) can answer. A prompt dropped without a
//! reply, or a closed prompt channel, counts as `Skip`.

use std::sync::mpsc::{self, Receiver, Sender};

use tracing::warn;

use crate::record::ProductRecord;
use crate::schema::{AttributeKind, Concentration, SizeUnit};

use super::resolver::{Answer, InteractiveContext, InteractiveResolver, DEFAULT_CONFIDENCE_THRESHOLD};

/// The question a prompt asks.
#[derive(Debug, Clone, PartialEq)]
pub enum Question {
    Brand { candidates: Vec<u32> },
    Concentration { candidates: Vec<Concentration> },
    Size { candidates: Vec<(String, SizeUnit)> },
    General { question: String, options: Vec<String> },
    ShouldLearn { original_text: String, detected_summary: String },
    TeachingStatements,
}

/// A reply; its variant must match the question.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Brand(Answer<u32>),
    Concentration(Answer<Concentration>),
    Size(Answer<(String, SizeUnit)>),
    General(Answer<usize>),
    Learn(bool),
    Statements(Vec<String>),
}

/// An owned copy of the decision context plus the question.
#[derive(Debug)]
pub struct Prompt {
    pub row_number: usize,
    pub attribute: AttributeKind,
    pub field_name: &'static str,
    pub original_text: String,
    pub raw_row_text: String,
    pub confidence: f64,
    pub record: ProductRecord,
    pub question: Question,
    reply: Sender<Reply>,
}

impl Prompt {
    /// Send the reply. Returns false if the converter stopped waiting.
    pub fn answer(self, reply: Reply) -> bool {
        self.reply.send(reply).is_ok()
    }
}

/// Forwards every question over a channel and blocks for the reply.
#[derive(Debug)]
pub struct ChannelResolver {
    prompts: Sender<Prompt>,
    threshold: f64,
}

impl ChannelResolver {
    pub fn new(prompts: Sender<Prompt>) -> Self {
        Self {
            prompts,
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }

    /// A resolver and the receiving end of its prompts.
    pub fn channel() -> (Self, Receiver<Prompt>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    fn ask(&self, context: &InteractiveContext<'_>, question: Question) -> Option<Reply> {
        let (reply_tx, reply_rx) = mpsc::channel();
        let prompt = Prompt {
            row_number: context.row_number,
            attribute: context.attribute,
            field_name: context.field_name,
            original_text: context.original_text.to_string(),
            raw_row_text: context.raw_row_text.to_string(),
            confidence: context.confidence,
            record: context.record.clone(),
            question,
            reply: reply_tx,
        };

        if self.prompts.send(prompt).is_err() {
            warn!(row = context.row_number, "prompt channel closed");
            return None;
        }
        reply_rx.recv().ok()
    }
}

fn mismatched<T>(row: usize, reply: Option<Reply>) -> Answer<T> {
    if let Some(reply) = reply {
        warn!(row, reply = ?reply, "reply does not match the question");
    }
    Answer::Skip
}

impl InteractiveResolver for ChannelResolver {
    fn resolve_brand(&mut self, context: &InteractiveContext<'_>, candidates: &[u32]) -> Answer<u32> {
        let question = Question::Brand {
            candidates: candidates.to_vec(),
        };
        match self.ask(context, question) {
            Some(Reply::Brand(answer)) => answer,
            other => mismatched(context.row_number, other),
        }
    }

    fn resolve_concentration(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[Concentration],
    ) -> Answer<Concentration> {
        let question = Question::Concentration {
            candidates: candidates.to_vec(),
        };
        match self.ask(context, question) {
            Some(Reply::Concentration(answer)) => answer,
            other => mismatched(context.row_number, other),
        }
    }

    fn resolve_size(
        &mut self,
        context: &InteractiveContext<'_>,
        candidates: &[(String, SizeUnit)],
    ) -> Answer<(String, SizeUnit)> {
        let question = Question::Size {
            candidates: candidates.to_vec(),
        };
        match self.ask(context, question) {
            Some(Reply::Size(answer)) => answer,
            other => mismatched(context.row_number, other),
        }
    }

    fn resolve_general(
        &mut self,
        context: &InteractiveContext<'_>,
        question: &str,
        options: &[String],
    ) -> Answer<usize> {
        let question = Question::General {
            question: question.to_string(),
            options: options.to_vec(),
        };
        match self.ask(context, question) {
            Some(Reply::General(Answer::Use(i))) if i >= options.len() => {
                warn!(row = context.row_number, index = i, "option out of range");
                Answer::Skip
            }
            Some(Reply::General(answer)) => answer,
            other => mismatched(context.row_number, other),
        }
    }

    fn should_learn(
        &mut self,
        context: &InteractiveContext<'_>,
        original_text: &str,
        detected_summary: &str,
    ) -> bool {
        let question = Question::ShouldLearn {
            original_text: original_text.to_string(),
            detected_summary: detected_summary.to_string(),
        };
        matches!(self.ask(context, question), Some(Reply::Learn(true)))
    }

    fn teaching_statements(&mut self, context: &InteractiveContext<'_>) -> Vec<String> {
        match self.ask(context, Question::TeachingStatements) {
            Some(Reply::Statements(statements)) => statements,
            _ => Vec::new(),
        }
    }

    fn confidence_threshold(&self) -> f64 {
        self.threshold
    }
}
