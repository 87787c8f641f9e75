use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "deskpilot", version, about = "Desktop automation agent")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file, overriding the default lookup chain.
    #[arg(long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Decompose an instruction and execute it on the desktop.
    Run(RunArgs),
    /// Decompose only and print the plan as JSON.
    Plan(PlanArgs),
    /// Report which capability providers are available.
    Probe,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct RunArgs {
    /// Natural-language instruction.
    pub instruction: String,

    /// Skip triage and treat the instruction as an automation task.
    #[arg(long)]
    pub force: bool,

    /// Print the plan and exit without executing.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct PlanArgs {
    /// Natural-language instruction.
    pub instruction: String,
}
