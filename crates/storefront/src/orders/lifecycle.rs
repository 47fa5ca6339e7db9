//! Order lifecycle rules: who may perform which transition, under which guard, and
//! what it changes.
//!
//! The same table is evaluated on the client (to refuse requests that are known to
//! fail and to decide which buttons to show) and by the reference backend (as the
//! authority). `now` is always passed in.

use crate::model::Order;
use chrono::{DateTime, Duration, Utc};
use std::fmt::Display;
use thiserror::Error;

/// How long after placing it a customer may still cancel a paid order.
pub const CUSTOMER_CANCEL_WINDOW_HOURS: i64 = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// Display stage derived from the lifecycle flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Pending,
    Paid,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Stage::Pending => "Pending",
            Stage::Paid => "Paid",
            Stage::Shipped => "Shipped",
            Stage::Delivered => "Delivered",
            Stage::Cancelled => "Cancelled",
            Stage::Refunded => "Refunded",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Admin records a payment made outside the gateway.
    MarkPaid,
    /// The owner pays with a payment result.
    Pay,
    Ship,
    /// Delivery confirmation ("receive").
    Deliver,
    Cancel,
    Refund,
    Delete,
}

impl Transition {
    pub const ALL: [Transition; 7] = [
        Transition::MarkPaid,
        Transition::Pay,
        Transition::Ship,
        Transition::Deliver,
        Transition::Cancel,
        Transition::Refund,
        Transition::Delete,
    ];

    fn permitted_for(self, role: Role) -> bool {
        match (self, role) {
            (Transition::Pay, Role::Customer) => true,
            (Transition::Pay, Role::Admin) => false,
            (Transition::Deliver | Transition::Cancel, _) => true,
            (_, Role::Admin) => true,
            (_, Role::Customer) => false,
        }
    }

    /// Checks role and guard. A `Customer` is assumed to own the order; ownership is
    /// verified by whoever holds the authoritative record.
    pub fn check(self, order: &Order, role: Role, now: DateTime<Utc>) -> Result<(), GuardError> {
        if !self.permitted_for(role) {
            return Err(GuardError::NotPermitted {
                transition: self,
                role,
            });
        }
        match self {
            Transition::MarkPaid | Transition::Pay => {
                refuse_if(order.is_paid, GuardError::AlreadyPaid)?;
                refuse_if(order.is_cancelled, GuardError::Cancelled)?;
            }
            Transition::Ship => {
                refuse_if(!order.is_paid, GuardError::NotPaid)?;
                refuse_if(order.is_shipped, GuardError::AlreadyShipped)?;
                refuse_if(order.is_cancelled, GuardError::Cancelled)?;
            }
            Transition::Deliver => {
                refuse_if(!order.is_shipped, GuardError::NotShipped)?;
                refuse_if(order.is_delivered, GuardError::AlreadyDelivered)?;
                refuse_if(order.is_cancelled, GuardError::Cancelled)?;
            }
            Transition::Cancel => {
                refuse_if(order.is_cancelled, GuardError::Cancelled)?;
                refuse_if(order.is_delivered, GuardError::AlreadyDelivered)?;
                refuse_if(order.is_shipped, GuardError::AlreadyShipped)?;
                if role == Role::Customer && order.is_paid {
                    let deadline =
                        order.created_at + Duration::hours(CUSTOMER_CANCEL_WINDOW_HOURS);
                    refuse_if(now > deadline, GuardError::CancelWindowElapsed)?;
                }
            }
            Transition::Refund => {
                refuse_if(!order.is_cancelled, GuardError::NotCancelled)?;
                refuse_if(!order.is_paid, GuardError::NotPaid)?;
                refuse_if(order.is_refunded, GuardError::AlreadyRefunded)?;
            }
            Transition::Delete => {
                refuse_if(order.is_shipped, GuardError::AlreadyShipped)?;
                refuse_if(order.is_delivered, GuardError::AlreadyDelivered)?;
                refuse_if(order.is_refunded, GuardError::AlreadyRefunded)?;
            }
        }
        Ok(())
    }

    /// Applies the effect of a transition whose guard already passed. `Delete` has no
    /// effect on the record itself.
    pub fn apply(self, order: &mut Order, now: DateTime<Utc>) {
        match self {
            Transition::MarkPaid | Transition::Pay => {
                order.is_paid = true;
                order.paid_at = Some(now);
            }
            Transition::Ship => {
                order.is_shipped = true;
                order.shipped_at = Some(now);
            }
            Transition::Deliver => {
                order.is_delivered = true;
                order.delivered_at = Some(now);
            }
            Transition::Cancel => {
                order.is_cancelled = true;
                order.cancelled_at = Some(now);
            }
            Transition::Refund => {
                order.is_refunded = true;
                order.refunded_at = Some(now);
                order.refund_amount = Some(order.total_price);
            }
            Transition::Delete => return,
        }
        order.updated_at = now;
    }
}

impl Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Transition::MarkPaid => "mark paid",
            Transition::Pay => "pay",
            Transition::Ship => "ship",
            Transition::Deliver => "mark delivered",
            Transition::Cancel => "cancel",
            Transition::Refund => "refund",
            Transition::Delete => "delete",
        };
        f.write_str(label)
    }
}

fn refuse_if(condition: bool, error: GuardError) -> Result<(), GuardError> {
    if condition {
        Err(error)
    } else {
        Ok(())
    }
}

/// Why a transition is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("A {role:?} cannot {transition} an order")]
    NotPermitted { transition: Transition, role: Role },
    #[error("Order is already paid")]
    AlreadyPaid,
    #[error("Order is not paid")]
    NotPaid,
    #[error("Order is already shipped")]
    AlreadyShipped,
    #[error("Order has not been shipped")]
    NotShipped,
    #[error("Order is already delivered")]
    AlreadyDelivered,
    #[error("Order is cancelled")]
    Cancelled,
    #[error("Order is not cancelled")]
    NotCancelled,
    #[error("Order is already refunded")]
    AlreadyRefunded,
    #[error("Paid orders can only be cancelled within 24 hours of purchase")]
    CancelWindowElapsed,
}

impl Order {
    /// Refunded > Cancelled > Delivered > Shipped > Paid > Pending.
    pub fn stage(&self) -> Stage {
        if self.is_refunded {
            Stage::Refunded
        } else if self.is_cancelled {
            Stage::Cancelled
        } else if self.is_delivered {
            Stage::Delivered
        } else if self.is_shipped {
            Stage::Shipped
        } else if self.is_paid {
            Stage::Paid
        } else {
            Stage::Pending
        }
    }
}

/// The transitions a UI should offer for this order, role and time.
pub fn available_transitions(order: &Order, role: Role, now: DateTime<Utc>) -> Vec<Transition> {
    Transition::ALL
        .into_iter()
        .filter(|t| t.check(order, role, now).is_ok())
        .collect()
}
