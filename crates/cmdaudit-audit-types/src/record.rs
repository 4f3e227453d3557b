//! The per-command audit record.

use crate::PathAction;
use serde::{Deserialize, Serialize};

/// Identity fields copied from a record into each of its path actions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandIdentity {
    pub cmdid: u64,
    pub pcmdid: u64,
    pub depth: u64,
    pub pccode: Option<String>,
    pub ccode: Option<String>,
}

/// Header fields sent with SOA and EOA records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandHeader {
    pub cmdid: u64,
    pub pcmdid: u64,
    pub depth: u64,
    pub prog: String,
    pub rwd: String,
    pub host: String,
    pub line: String,
    #[serde(default)]
    pub pccode: Option<String>,
    #[serde(default)]
    pub ccode: Option<String>,
    #[serde(default)]
    pub aggregated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recycled: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freetext: Option<String>,
}

/// Audit session for one process-as-command.
///
/// Created when a process image starts after exec; the command id is fixed
/// at that point. Path actions are kept in observation order.
#[derive(Debug, Clone)]
pub struct CommandAuditRecord {
    cmdid: u64,
    pcmdid: u64,
    depth: u64,
    prog: String,
    rwd: String,
    host: String,
    line: String,
    pccode: Option<String>,
    ccode: Option<String>,
    started: bool,
    recycled: Option<String>,
    freetext: Option<String>,
    actions: Vec<PathAction>,
}

impl CommandAuditRecord {
    /// Start building a record for `cmdid`.
    pub fn builder(cmdid: u64) -> CommandAuditRecordBuilder {
        CommandAuditRecordBuilder::new(cmdid)
    }

    pub fn cmdid(&self) -> u64 {
        self.cmdid
    }

    pub fn pcmdid(&self) -> u64 {
        self.pcmdid
    }

    pub fn depth(&self) -> u64 {
        self.depth
    }

    pub fn prog(&self) -> &str {
        &self.prog
    }

    pub fn rwd(&self) -> &str {
        &self.rwd
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn line(&self) -> &str {
        &self.line
    }

    pub fn pccode(&self) -> Option<&str> {
        self.pccode.as_deref()
    }

    pub fn ccode(&self) -> Option<&str> {
        self.ccode.as_deref()
    }

    pub fn freetext(&self) -> Option<&str> {
        self.freetext.as_deref()
    }

    /// Whether an SOA has been issued for this record.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Mark the SOA as issued. Returns false if it already was.
    pub fn mark_started(&mut self) -> bool {
        !std::mem::replace(&mut self.started, true)
    }

    /// Prior command this one was recycled from.
    pub fn recycled(&self) -> Option<&str> {
        self.recycled.as_deref()
    }

    /// Record the prior command id. The first value sticks; returns false
    /// if one was already set.
    pub fn set_recycled(&mut self, prior: impl Into<String>) -> bool {
        if self.recycled.is_some() {
            return false;
        }
        self.recycled = Some(prior.into());
        true
    }

    /// Fields copied into each path action.
    pub fn identity(&self) -> CommandIdentity {
        CommandIdentity {
            cmdid: self.cmdid,
            pcmdid: self.pcmdid,
            depth: self.depth,
            pccode: self.pccode.clone(),
            ccode: self.ccode.clone(),
        }
    }

    /// Header for SOA/EOA records.
    pub fn header(&self, aggregated: bool) -> CommandHeader {
        CommandHeader {
            cmdid: self.cmdid,
            pcmdid: self.pcmdid,
            depth: self.depth,
            prog: self.prog.clone(),
            rwd: self.rwd.clone(),
            host: self.host.clone(),
            line: self.line.clone(),
            pccode: self.pccode.clone(),
            ccode: self.ccode.clone(),
            aggregated,
            recycled: self.recycled.clone(),
            freetext: self.freetext.clone(),
        }
    }

    /// Append a path action.
    pub fn record(&mut self, action: PathAction) {
        self.actions.push(action);
    }

    /// Number of pending path actions.
    pub fn action_count(&self) -> usize {
        self.actions.len()
    }

    /// Pending path actions in observation order.
    pub fn actions(&self) -> &[PathAction] {
        &self.actions
    }

    /// Remove and return the pending path actions.
    pub fn take_actions(&mut self) -> Vec<PathAction> {
        std::mem::take(&mut self.actions)
    }

    /// The record a forked child continues with until its own exec.
    ///
    /// Same identity, so the child's activity is attributed to this command,
    /// but not started: the child never issues this command's EOA.
    pub fn fork_child(&self) -> Self {
        Self {
            cmdid: self.cmdid,
            pcmdid: self.pcmdid,
            depth: self.depth,
            prog: self.prog.clone(),
            rwd: self.rwd.clone(),
            host: self.host.clone(),
            line: self.line.clone(),
            pccode: self.pccode.clone(),
            ccode: self.ccode.clone(),
            started: false,
            recycled: self.recycled.clone(),
            freetext: None,
            actions: Vec::new(),
        }
    }
}

/// Builder for command audit records.
#[derive(Debug)]
pub struct CommandAuditRecordBuilder {
    record: CommandAuditRecord,
}

impl CommandAuditRecordBuilder {
    /// Create a new builder.
    pub fn new(cmdid: u64) -> Self {
        Self {
            record: CommandAuditRecord {
                cmdid,
                pcmdid: 0,
                depth: 0,
                prog: String::new(),
                rwd: String::new(),
                host: String::new(),
                line: String::new(),
                pccode: None,
                ccode: None,
                started: false,
                recycled: None,
                freetext: None,
                actions: Vec::new(),
            },
        }
    }

    pub fn pcmdid(mut self, pcmdid: u64) -> Self {
        self.record.pcmdid = pcmdid;
        self
    }

    pub fn depth(mut self, depth: u64) -> Self {
        self.record.depth = depth;
        self
    }

    pub fn prog(mut self, prog: impl Into<String>) -> Self {
        self.record.prog = prog.into();
        self
    }

    pub fn rwd(mut self, rwd: impl Into<String>) -> Self {
        self.record.rwd = rwd.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.record.host = host.into();
        self
    }

    pub fn line(mut self, line: impl Into<String>) -> Self {
        self.record.line = line.into();
        self
    }

    pub fn pccode(mut self, pccode: Option<String>) -> Self {
        self.record.pccode = pccode;
        self
    }

    pub fn ccode(mut self, ccode: Option<String>) -> Self {
        self.record.ccode = ccode;
        self
    }

    pub fn freetext(mut self, freetext: Option<String>) -> Self {
        self.record.freetext = freetext;
        self
    }

    /// Build the record.
    pub fn build(self) -> CommandAuditRecord {
        self.record
    }
}
