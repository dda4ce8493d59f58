//! Admin order list with optimistic status changes.
//!
//! A status change is dispatched as a command: the row shows the requested
//! status at once and remembers the last confirmed one. The backend's answer
//! then either confirms the row or reverts it. A newer command on the same
//! order supersedes the older one, whose answer is dropped.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::order::{Order, OrderStatus};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PendingChange {
    pub command_id: Uuid,
    pub requested: OrderStatus,
    pub previous: OrderStatus,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdminOrderRow {
    #[serde(flatten)]
    pub order: Order,
    pub pending: Option<PendingChange>,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCommand {
    pub command_id: Uuid,
    pub order_id: u64,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Reconciliation {
    Confirmed,
    Reverted { restored: OrderStatus },
    Superseded,
}

#[derive(Debug, Clone, Default)]
pub struct AdminOrderPanel {
    rows: Vec<AdminOrderRow>,
    loaded_at: Option<DateTime<Utc>>,
}

impl AdminOrderPanel {
    pub fn from_orders(orders: Vec<Order>) -> Self {
        let mut panel = Self::default();
        panel.replace_orders(orders);
        panel
    }

    /// Swaps in a fresh listing. Rows with a command in flight keep it.
    pub fn replace_orders(&mut self, orders: Vec<Order>) {
        let mut rows: Vec<AdminOrderRow> = orders
            .into_iter()
            .map(|mut order| {
                let pending = self
                    .row(order.id)
                    .and_then(|existing| existing.pending.clone());
                if let Some(change) = &pending {
                    order.status = change.requested;
                }
                AdminOrderRow {
                    order,
                    pending,
                    last_error: None,
                }
            })
            .collect();

        rows.sort_by(|a, b| b.order.id.cmp(&a.order.id));
        self.rows = rows;
        self.loaded_at = Some(Utc::now());
    }

    pub fn rows(&self) -> &[AdminOrderRow] {
        &self.rows
    }

    pub fn loaded_at(&self) -> Option<DateTime<Utc>> {
        self.loaded_at
    }

    pub fn row(&self, order_id: u64) -> Option<&AdminOrderRow> {
        self.rows.iter().find(|row| row.order.id == order_id)
    }

    fn row_mut(&mut self, order_id: u64) -> Option<&mut AdminOrderRow> {
        self.rows.iter_mut().find(|row| row.order.id == order_id)
    }

    /// Applies the requested status locally. `None` when the order is not listed.
    pub fn dispatch(&mut self, order_id: u64, status: OrderStatus) -> Option<StatusCommand> {
        let row = self.row_mut(order_id)?;

        let previous = row
            .pending
            .as_ref()
            .map_or(row.order.status, |change| change.previous);
        let command_id = Uuid::new_v4();

        row.order.status = status;
        row.pending = Some(PendingChange {
            command_id,
            requested: status,
            previous,
        });
        row.last_error = None;

        Some(StatusCommand {
            command_id,
            order_id,
            status,
        })
    }

    pub fn reconcile(
        &mut self,
        command: &StatusCommand,
        result: Result<Order, String>,
    ) -> Reconciliation {
        let Some(row) = self.row_mut(command.order_id) else {
            return Reconciliation::Superseded;
        };
        let Some(change) = row
            .pending
            .take_if(|change| change.command_id == command.command_id)
        else {
            return Reconciliation::Superseded;
        };

        match result {
            Ok(order) => {
                row.order = order;
                row.last_error = None;
                Reconciliation::Confirmed
            }
            Err(message) => {
                row.order.status = change.previous;
                row.last_error = Some(message);
                Reconciliation::Reverted {
                    restored: change.previous,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: u64, status: OrderStatus) -> Order {
        Order {
            id,
            status,
            location: None,
            locker: None,
            services: None,
            schedule: None,
            details: None,
            pricing: None,
            created_at: None,
            updated_at: None,
            awb: None,
        }
    }

    fn panel() -> AdminOrderPanel {
        AdminOrderPanel::from_orders(vec![
            order(7, OrderStatus::Pending),
            order(42, OrderStatus::Processing),
            order(13, OrderStatus::Scheduled),
        ])
    }

    #[test]
    fn rows_are_listed_newest_first() {
        let ids: Vec<u64> = panel().rows().iter().map(|r| r.order.id).collect();
        assert_eq!(ids, vec![42, 13, 7]);
    }

    #[test]
    fn dispatch_shows_requested_status_immediately() {
        let mut panel = panel();
        let command = panel.dispatch(42, OrderStatus::Completed).unwrap();

        let row = panel.row(42).unwrap();
        assert_eq!(row.order.status, OrderStatus::Completed);
        assert_eq!(
            row.pending,
            Some(PendingChange {
                command_id: command.command_id,
                requested: OrderStatus::Completed,
                previous: OrderStatus::Processing,
            })
        );
        assert!(panel.dispatch(999, OrderStatus::Completed).is_none());
    }

    #[test]
    fn backend_failure_reverts_the_row() {
        let mut panel = panel();
        let command = panel.dispatch(42, OrderStatus::Completed).unwrap();

        let outcome = panel.reconcile(&command, Err("backend returned 500".to_string()));

        assert_eq!(
            outcome,
            Reconciliation::Reverted {
                restored: OrderStatus::Processing
            }
        );
        let row = panel.row(42).unwrap();
        assert_eq!(row.order.status, OrderStatus::Processing);
        assert!(row.pending.is_none());
        assert_eq!(row.last_error.as_deref(), Some("backend returned 500"));
    }

    #[test]
    fn backend_success_adopts_server_copy() {
        let mut panel = panel();
        let command = panel.dispatch(42, OrderStatus::Completed).unwrap();

        let mut confirmed = order(42, OrderStatus::Completed);
        confirmed.awb = Some("AWB123".to_string());

        assert_eq!(panel.reconcile(&command, Ok(confirmed)), Reconciliation::Confirmed);
        let row = panel.row(42).unwrap();
        assert_eq!(row.order.awb.as_deref(), Some("AWB123"));
        assert!(row.pending.is_none());
    }

    #[test]
    fn superseded_command_result_is_ignored() {
        let mut panel = panel();
        let first = panel.dispatch(13, OrderStatus::Processing).unwrap();
        let second = panel.dispatch(13, OrderStatus::Cancelled).unwrap();

        assert_eq!(
            panel.reconcile(&first, Err("stale".to_string())),
            Reconciliation::Superseded
        );
        assert_eq!(panel.row(13).unwrap().order.status, OrderStatus::Cancelled);

        assert_eq!(
            panel.reconcile(&second, Err("rejected".to_string())),
            Reconciliation::Reverted {
                restored: OrderStatus::Scheduled
            }
        );
    }

    #[test]
    fn refresh_keeps_in_flight_changes() {
        let mut panel = panel();
        let command = panel.dispatch(7, OrderStatus::Scheduled).unwrap();

        panel.replace_orders(vec![order(7, OrderStatus::Pending), order(50, OrderStatus::Pending)]);

        let row = panel.row(7).unwrap();
        assert_eq!(row.order.status, OrderStatus::Scheduled);
        assert_eq!(row.pending.as_ref().map(|p| p.command_id), Some(command.command_id));
        assert_eq!(panel.rows()[0].order.id, 50);
    }
}
