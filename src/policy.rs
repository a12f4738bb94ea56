use crate::models::{ChatMessage, Role};

/// Menu affordances, derived purely from the local role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReportAbuse,
    EndChat,
    BlockCounterpart,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::ReportAbuse => "report-abuse",
            Action::EndChat => "end-chat",
            Action::BlockCounterpart => "block-counterpart",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role-dependent peer identities. Configuration data supplied by the
/// caller, never hard-coded here.
#[derive(Debug, Clone)]
pub struct PeerLabels {
    pub customer_name: String,
    pub brand_name: String,
}

/// True when the message was authored by the local participant.
pub fn is_mine(message: &ChatMessage, role: Role) -> bool {
    message.sender == role
}

/// Menu actions for the local role: customers can report abuse or end the
/// chat, stores can block the counterpart.
pub fn available_actions(role: Role) -> &'static [Action] {
    match role {
        Role::Customer => &[Action::ReportAbuse, Action::EndChat],
        Role::Store => &[Action::BlockCounterpart],
    }
}

/// The counterpart's display identity: a store sees the customer, a
/// customer sees the store's brand.
pub fn peer_label(role: Role, labels: &PeerLabels) -> &str {
    match role {
        Role::Store => &labels.customer_name,
        Role::Customer => &labels.brand_name,
    }
}

/// The analytics report is offered to the store role once the chat has
/// ended.
pub fn report_available(role: Role, ended: bool) -> bool {
    ended && role == Role::Store
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn is_mine_compares_sender_to_local_role() {
        let message = ChatMessage::new(Role::Store, "hello");
        assert!(is_mine(&message, Role::Store));
        assert!(!is_mine(&message, Role::Customer));
    }

    #[test]
    fn customer_actions_are_report_and_end() {
        assert_eq!(
            available_actions(Role::Customer),
            &[Action::ReportAbuse, Action::EndChat]
        );
    }

    #[test]
    fn store_actions_are_block_only() {
        assert_eq!(available_actions(Role::Store), &[Action::BlockCounterpart]);
    }

    #[test]
    fn peer_label_is_role_dependent() {
        let labels = PeerLabels {
            customer_name: "최예인님".to_string(),
            brand_name: "Dior".to_string(),
        };
        assert_eq!(peer_label(Role::Store, &labels), "최예인님");
        assert_eq!(peer_label(Role::Customer, &labels), "Dior");
    }

    #[test]
    fn report_is_for_the_store_after_end() {
        assert!(report_available(Role::Store, true));
        assert!(!report_available(Role::Store, false));
        assert!(!report_available(Role::Customer, true));
        assert!(!report_available(Role::Customer, false));
    }
}
