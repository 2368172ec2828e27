use clap::Subcommand;
use pomocycle_core::{Database, SessionStore};

#[derive(Subcommand)]
pub enum GoalAction {
    /// Print the current goal
    Show,
    /// Replace the goal
    Set {
        /// Goal text; multiple words are joined with spaces
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove the goal
    Clear,
}

pub fn run(action: GoalAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let store = SessionStore::new(&db);

    match action {
        GoalAction::Show => println!("{}", store.load_goal()),
        GoalAction::Set { text } => {
            let text = text.join(" ");
            store.save_goal(&text)?;
            println!("{text}");
        }
        GoalAction::Clear => {
            store.save_goal("")?;
            println!("goal cleared");
        }
    }
    Ok(())
}
