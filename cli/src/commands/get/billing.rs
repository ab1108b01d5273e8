use anyhow::{anyhow, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use log::info;
use sbg_client::{BillingGroup, Client};
use structopt::StructOpt;

use crate::{errors::ValidationError, printer::Printer};

const DATE_FORMAT: &str = "%m-%d-%Y";

fn parse_date(string: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(string.trim(), DATE_FORMAT)
}

#[derive(Debug, StructOpt)]
pub struct GetBillingGroupArgs {
    #[structopt(name = "name")]
    /// Name of the billing group
    name: String,
}

#[derive(Debug, StructOpt)]
pub struct GetBillingBreakdownArgs {
    #[structopt(name = "name")]
    /// Name of the billing group
    name: String,

    #[structopt(long = "from", parse(try_from_str = parse_date))]
    /// First day, as mm-dd-yyyy. Defaults to a week before the last day.
    from: Option<NaiveDate>,

    #[structopt(long = "to", parse(try_from_str = parse_date))]
    /// Last day, as mm-dd-yyyy. Defaults to today.
    to: Option<NaiveDate>,
}

/// The single billing group called `name` among those visible to the user.
pub fn find_billing_group(client: &Client, name: &str, page_size: usize) -> Result<BillingGroup> {
    let groups = client
        .get_all_billing_groups(page_size)
        .context("Operation to list billing groups has failed.")?;
    pick_billing_group(groups, name)
}

fn pick_billing_group(groups: Vec<BillingGroup>, name: &str) -> Result<BillingGroup> {
    let mut matches = groups
        .into_iter()
        .filter(|group| group.name == name)
        .collect::<Vec<_>>();
    match matches.len() {
        0 => Err(anyhow!("No billing group named `{}`", name)),
        1 => Ok(matches.remove(0)),
        count => Err(anyhow!(
            "Found {} billing groups named `{}`, refusing to pick one",
            count,
            name
        )),
    }
}

fn breakdown_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate), ValidationError> {
    let to = to.unwrap_or(today);
    let from = from.unwrap_or(to - Duration::days(7));
    if from > to {
        return Err(ValidationError::Arguments("--from must not be after --to"));
    }
    Ok((from, to))
}

pub fn get_group(
    client: &Client,
    args: &GetBillingGroupArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let group = find_billing_group(client, &args.name, page_size)?;
    printer.print_resources(&[group])
}

pub fn get_breakdown(
    client: &Client,
    args: &GetBillingBreakdownArgs,
    printer: &Printer,
    page_size: usize,
) -> Result<()> {
    let (from, to) = breakdown_range(args.from, args.to, Local::now().date_naive())?;
    let group = find_billing_group(client, &args.name, page_size)?;
    info!(
        "Storage costs of `{}` ({}) from {} to {}",
        group.name, group.id, from, to
    );

    let mut breakdowns = client
        .get_all_storage_breakdowns(&group.id, from, to, page_size)
        .with_context(|| format!("Could not get the storage breakdown of `{}`", group.name))?;
    breakdowns.sort_by(|lhs, rhs| rhs.total_cost().total_cmp(&lhs.total_cost()));

    let total: f64 = breakdowns.iter().map(|breakdown| breakdown.total_cost()).sum();
    printer.print_resources(&breakdowns)?;
    info!("Total over {} projects: {:.2}", breakdowns.len(), total);
    Ok(())
}
