//! # Status Vocabularies
//!
//! Off-chain status enums for every entity family, plus the transition
//! predicates the reconciliation services enforce. On-chain numeric status
//! codes are mapped into these vocabularies by the ledger crate; this
//! module only knows the off-chain side.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role a user plays on the platform. Auto-provisioned users get [`UserRole::Both`]
/// because a wallet first seen on an escrow deal may sit on either side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Requester,
    Worker,
    #[default]
    Both,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Requester => "requester",
            UserRole::Worker => "worker",
            UserRole::Both => "both",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "requester" => Ok(UserRole::Requester),
            "worker" => Ok(UserRole::Worker),
            "both" => Ok(UserRole::Both),
            other => Err(format!("unknown user role: {other}")),
        }
    }
}

/// Arena round lifecycle. Forward-only, externally driven by ledger state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    Proposing,
    Voting,
    Active,
    Judging,
    Completed,
}

impl RoundStatus {
    /// Position in the forward-only order.
    pub fn order(self) -> u8 {
        match self {
            RoundStatus::Proposing => 0,
            RoundStatus::Voting => 1,
            RoundStatus::Active => 2,
            RoundStatus::Judging => 3,
            RoundStatus::Completed => 4,
        }
    }

    /// True if moving from `self` to `target` goes forward in the listed order.
    pub fn allows_advance_to(self, target: RoundStatus) -> bool {
        target.order() > self.order()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RoundStatus::Proposing => "proposing",
            RoundStatus::Voting => "voting",
            RoundStatus::Active => "active",
            RoundStatus::Judging => "judging",
            RoundStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for RoundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoundStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "proposing" => Ok(RoundStatus::Proposing),
            "voting" => Ok(RoundStatus::Voting),
            "active" => Ok(RoundStatus::Active),
            "judging" => Ok(RoundStatus::Judging),
            "completed" => Ok(RoundStatus::Completed),
            other => Err(format!("unknown round status: {other}")),
        }
    }
}

/// Marketplace proposal lifecycle. Terminal on either branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, ProposalStatus::Pending)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProposalStatus::Pending => "pending",
            ProposalStatus::Accepted => "accepted",
            ProposalStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProposalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ProposalStatus::Pending),
            "accepted" => Ok(ProposalStatus::Accepted),
            "rejected" => Ok(ProposalStatus::Rejected),
            other => Err(format!("unknown proposal status: {other}")),
        }
    }
}

/// Task request lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskRequestStatus {
    #[default]
    Open,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
}

impl TaskRequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskRequestStatus::Open => "open",
            TaskRequestStatus::InProgress => "in_progress",
            TaskRequestStatus::Completed => "completed",
            TaskRequestStatus::Cancelled => "cancelled",
            TaskRequestStatus::Disputed => "disputed",
        }
    }
}

impl fmt::Display for TaskRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(TaskRequestStatus::Open),
            "in_progress" => Ok(TaskRequestStatus::InProgress),
            "completed" => Ok(TaskRequestStatus::Completed),
            "cancelled" => Ok(TaskRequestStatus::Cancelled),
            "disputed" => Ok(TaskRequestStatus::Disputed),
            other => Err(format!("unknown task request status: {other}")),
        }
    }
}

/// Escrow deal lifecycle, externally driven for ledger-backed rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EscrowStatus {
    #[default]
    Created,
    Funded,
    Completed,
    Released,
    Disputed,
    Refunded,
}

impl EscrowStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EscrowStatus::Created => "created",
            EscrowStatus::Funded => "funded",
            EscrowStatus::Completed => "completed",
            EscrowStatus::Released => "released",
            EscrowStatus::Disputed => "disputed",
            EscrowStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for EscrowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EscrowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(EscrowStatus::Created),
            "funded" => Ok(EscrowStatus::Funded),
            "completed" => Ok(EscrowStatus::Completed),
            "released" => Ok(EscrowStatus::Released),
            "disputed" => Ok(EscrowStatus::Disputed),
            "refunded" => Ok(EscrowStatus::Refunded),
            other => Err(format!("unknown escrow status: {other}")),
        }
    }
}

/// Direct (peer-to-peer) deal lifecycle.
///
/// The accepted path continues through escrow settlement; `Expired` is
/// reachable only from `Pending` once the deadline has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DirectStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    EscrowCreated,
    Funded,
    Completed,
    Released,
    Expired,
}

impl DirectStatus {
    /// Valid single-step transitions on the direct-deal state machine.
    pub fn can_transition(self, target: DirectStatus) -> bool {
        use DirectStatus::*;
        matches!(
            (self, target),
            (Pending, Accepted)
                | (Pending, Rejected)
                | (Pending, Expired)
                | (Accepted, EscrowCreated)
                | (EscrowCreated, Funded)
                | (Funded, Completed)
                | (Completed, Released)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DirectStatus::Pending => "pending",
            DirectStatus::Accepted => "accepted",
            DirectStatus::Rejected => "rejected",
            DirectStatus::EscrowCreated => "escrow_created",
            DirectStatus::Funded => "funded",
            DirectStatus::Completed => "completed",
            DirectStatus::Released => "released",
            DirectStatus::Expired => "expired",
        }
    }
}

impl fmt::Display for DirectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DirectStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DirectStatus::Pending),
            "accepted" => Ok(DirectStatus::Accepted),
            "rejected" => Ok(DirectStatus::Rejected),
            "escrow_created" => Ok(DirectStatus::EscrowCreated),
            "funded" => Ok(DirectStatus::Funded),
            "completed" => Ok(DirectStatus::Completed),
            "released" => Ok(DirectStatus::Released),
            "expired" => Ok(DirectStatus::Expired),
            other => Err(format!("unknown direct deal status: {other}")),
        }
    }
}
