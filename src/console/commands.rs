/// A page of numbered choices. The operator types the 1-based number of the
/// choice.
pub trait MenuCommand: Copy + 'static {
    /// The choices, in display order.
    const ALL: &'static [Self];

    fn label(&self) -> &'static str;

    fn parse(input: &str) -> Option<Self> {
        let idx = input.trim().parse::<usize>().ok()?;
        idx.checked_sub(1).and_then(|i| Self::ALL.get(i)).copied()
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MainCommand {
    AdminLogin,
    VoterLogin,
    Exit,
}

impl MenuCommand for MainCommand {
    const ALL: &'static [Self] = &[
        MainCommand::AdminLogin,
        MainCommand::VoterLogin,
        MainCommand::Exit,
    ];

    fn label(&self) -> &'static str {
        match self {
            MainCommand::AdminLogin => "Admin Login",
            MainCommand::VoterLogin => "Voter Login",
            MainCommand::Exit => "Exit",
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum AdminCommand {
    CreateElection,
    ViewElections,
    Logout,
}

impl MenuCommand for AdminCommand {
    const ALL: &'static [Self] = &[
        AdminCommand::CreateElection,
        AdminCommand::ViewElections,
        AdminCommand::Logout,
    ];

    fn label(&self) -> &'static str {
        match self {
            AdminCommand::CreateElection => "Create Election",
            AdminCommand::ViewElections => "View Elections",
            AdminCommand::Logout => "Logout",
        }
    }
}

/// The actions on a single election.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ManageCommand {
    AddCandidate,
    AddVoter,
    ViewCandidates,
    ViewVoters,
    RemoveCandidate,
    RemoveVoter,
    ViewResults,
    PublishResults,
    DeleteElection,
    GoBack,
}

impl MenuCommand for ManageCommand {
    const ALL: &'static [Self] = &[
        ManageCommand::AddCandidate,
        ManageCommand::AddVoter,
        ManageCommand::ViewCandidates,
        ManageCommand::ViewVoters,
        ManageCommand::RemoveCandidate,
        ManageCommand::RemoveVoter,
        ManageCommand::ViewResults,
        ManageCommand::PublishResults,
        ManageCommand::DeleteElection,
        ManageCommand::GoBack,
    ];

    fn label(&self) -> &'static str {
        match self {
            ManageCommand::AddCandidate => "Add Candidate",
            ManageCommand::AddVoter => "Add Voter",
            ManageCommand::ViewCandidates => "View Candidates",
            ManageCommand::ViewVoters => "View Voters",
            ManageCommand::RemoveCandidate => "Remove Candidate",
            ManageCommand::RemoveVoter => "Remove Voter",
            ManageCommand::ViewResults => "View Results",
            ManageCommand::PublishResults => "Publish Results",
            ManageCommand::DeleteElection => "Delete Election",
            ManageCommand::GoBack => "Go Back",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_select_commands() {
        assert_eq!(MainCommand::parse(" 2 "), Some(MainCommand::VoterLogin));
        assert_eq!(ManageCommand::parse("10"), Some(ManageCommand::GoBack));
        assert_eq!(AdminCommand::parse("0"), None);
        assert_eq!(AdminCommand::parse("4"), None);
        assert_eq!(AdminCommand::parse("Logout"), None);
    }
}
