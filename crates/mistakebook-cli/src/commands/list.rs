//! List command implementation.

use crate::cli::ListArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use chrono::Utc;
use mistakebook_domain::{paginate, MistakeFilter, SortDirection, TimeWindow};
use mistakebook_sdk::{ListQuery, MistakeClient};
use tracing::debug;

/// Execute the list command.
pub async fn execute_list(
    args: ListArgs,
    client: &MistakeClient,
    formatter: &Formatter,
    default_subject: Option<&str>,
    default_page_size: usize,
) -> Result<()> {
    if args.page == 0 {
        return Err(CliError::InvalidInput("Page numbers start at 1".to_string()));
    }

    let query = server_query(&args, default_subject);
    let response = client.list_mistakes(&query).await?;
    debug!(
        total = response.total_count,
        returned = response.mistakes.len(),
        "mistakes fetched"
    );

    let filter = local_filter(&args);
    let matched = filter.apply(&response.mistakes, Utc::now());
    let page = paginate(&matched, args.page, args.page_size.unwrap_or(default_page_size));

    println!("{}", formatter.format_records(&page)?);
    Ok(())
}

/// The server takes one subject and one error type. A single value is
/// filtered there; several are left to [`local_filter`].
fn server_query(args: &ListArgs, default_subject: Option<&str>) -> ListQuery {
    let subject = match args.subject.as_slice() {
        [] => default_subject.map(str::to_string),
        [one] => Some(one.clone()),
        _ => None,
    };
    let error_type = match args.error_type.as_slice() {
        [one] => Some(one.clone()),
        _ => None,
    };

    ListQuery {
        subject,
        error_type,
        knowledge_point: args.knowledge_point.clone(),
        skip: args.skip,
        limit: args.limit,
    }
}

/// Criteria applied on top of what the server already filtered.
fn local_filter(args: &ListArgs) -> MistakeFilter {
    let direction = if args.desc {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    };

    let several = |values: &[String]| {
        if values.len() > 1 {
            values.to_vec()
        } else {
            Vec::new()
        }
    };

    MistakeFilter {
        search_term: args.search.clone(),
        subjects: several(&args.subject),
        error_types: several(&args.error_type),
        window: args.since.unwrap_or(TimeWindow::All),
        sort: args.sort.map(|field| (field, direction)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use mistakebook_domain::SortField;

    fn list_args(argv: &[&str]) -> ListArgs {
        let mut full = vec!["mistakebook", "list"];
        full.extend_from_slice(argv);
        match Cli::parse_from(full).command {
            Command::List(args) => args,
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_local_filter_from_args() {
        let filter = local_filter(&list_args(&["--search", "分数", "--since", "month", "--sort", "subject", "--desc"]));
        assert_eq!(filter.search_term.as_deref(), Some("分数"));
        assert_eq!(filter.window, TimeWindow::Month);
        assert_eq!(filter.sort, Some((SortField::Subject, SortDirection::Desc)));
        assert!(filter.subjects.is_empty());
    }

    #[test]
    fn test_single_subject_goes_to_server() {
        let args = list_args(&["--subject", "数学", "--error-type", "计算错误"]);
        let query = server_query(&args, Some("语文"));
        assert_eq!(query.subject.as_deref(), Some("数学"));
        assert_eq!(query.error_type.as_deref(), Some("计算错误"));

        let filter = local_filter(&args);
        assert!(filter.subjects.is_empty());
        assert!(filter.error_types.is_empty());
    }

    #[test]
    fn test_several_subjects_filter_locally() {
        let args = list_args(&["-s", "数学", "-s", "物理", "-e", "计算错误", "-e", "概念不清"]);
        let query = server_query(&args, Some("语文"));
        assert_eq!(query.subject, None);
        assert_eq!(query.error_type, None);

        let filter = local_filter(&args);
        assert_eq!(filter.subjects, vec!["数学", "物理"]);
        assert_eq!(filter.error_types, vec!["计算错误", "概念不清"]);
    }

    #[test]
    fn test_profile_subject_used_when_none_given() {
        let query = server_query(&list_args(&[]), Some("语文"));
        assert_eq!(query.subject.as_deref(), Some("语文"));
        assert_eq!(query.limit, 100);
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let filter = local_filter(&list_args(&[]));
        assert_eq!(filter, MistakeFilter::default());
    }
}
