use clap::Args;

use crate::util::DatasetArg;

#[derive(Debug, Clone, Args)]
pub(crate) struct MilestonesArg {
    #[clap(flatten)]
    dataset: DatasetArg,
}

pub(crate) fn run(arg: &MilestonesArg) -> anyhow::Result<()> {
    let dataset = arg.dataset.read()?;
    let counts = dataset.milestone_counts();

    println!(
        "Milestones in {} ({} found)",
        arg.dataset.dataset.display(),
        counts.len()
    );
    for (i, (milestone, records)) in counts.iter().enumerate() {
        let default_mark = if i == 0 { " (default)" } else { "" };
        println!("  {milestone:<20} {records:>8} records{default_mark}");
    }
    Ok(())
}
