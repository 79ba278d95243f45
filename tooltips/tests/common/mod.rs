//! Recording tooltip widget shared by the integration tests.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use simplelog::{Config, LevelFilter, TestLogger};
use tipdom::NodeId;
use tooltips::{Tooltip, TooltipFactory, TooltipOptions, standard_defaults};

/// Route `log` output through the test harness. Later calls are no-ops.
pub fn init_logging() {
    let _ = TestLogger::init(LevelFilter::Trace, Config::default());
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Created {
    pub anchor: Option<NodeId>,
    pub content: String,
    pub options: TooltipOptions,
}

#[derive(Debug, Default)]
pub struct Log {
    pub created: Vec<Created>,
    /// (widget index, operation)
    pub calls: Vec<(usize, &'static str)>,
}

impl Log {
    pub fn count(&self, op: &str) -> usize {
        self.calls.iter().filter(|(_, o)| *o == op).count()
    }

    pub fn count_for(&self, index: usize, op: &str) -> usize {
        self.calls
            .iter()
            .filter(|(i, o)| *i == index && *o == op)
            .count()
    }

    pub fn index_of(&self, anchor: NodeId) -> Option<usize> {
        self.created.iter().position(|c| c.anchor == Some(anchor))
    }
}

pub type Shared = Rc<RefCell<Log>>;

pub struct RecordingTooltip {
    index: usize,
    visible: bool,
    log: Shared,
}

impl Tooltip<NodeId> for RecordingTooltip {
    fn show(&mut self) {
        self.visible = true;
        self.log.borrow_mut().calls.push((self.index, "show"));
    }

    fn hide(&mut self) {
        self.visible = false;
        self.log.borrow_mut().calls.push((self.index, "hide"));
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn destroy(&mut self) {
        self.visible = false;
        self.log.borrow_mut().calls.push((self.index, "destroy"));
    }

    fn reposition(&mut self) {
        self.log.borrow_mut().calls.push((self.index, "reposition"));
    }

    fn attach(&mut self, anchor: NodeId) {
        self.log.borrow_mut().created[self.index].anchor = Some(anchor);
    }
}

pub struct RecordingFactory {
    pub log: Shared,
}

impl RecordingFactory {
    pub fn new() -> (Self, Shared) {
        init_logging();
        let log = Shared::default();
        (Self { log: log.clone() }, log)
    }
}

impl TooltipFactory<NodeId> for RecordingFactory {
    fn defaults(&self) -> TooltipOptions {
        standard_defaults()
    }

    fn create(&self, content: &str, options: TooltipOptions) -> Box<dyn Tooltip<NodeId>> {
        let mut log = self.log.borrow_mut();
        let index = log.created.len();
        log.created.push(Created {
            anchor: None,
            content: content.to_string(),
            options,
        });
        Box::new(RecordingTooltip {
            index,
            visible: false,
            log: self.log.clone(),
        })
    }
}
