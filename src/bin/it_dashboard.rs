//! Operator console for the IT setup queue.
//!
//! Reads one command per line from stdin while the dashboard polls the
//! backend in the background. Type `help` for the command list.

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use it_desk::{
    config::Config,
    services::{
        ApiClient, Dashboard, DashboardSnapshot, NotificationProducer, NotificationStore,
        SetupFlow, Visibility,
    },
};

const HELP: &str = "\
commands:
  notify  <employeeId>|<name>|<department>|<table>   queue a new-employee setup
  update  <employeeId>|<name>|<department>|<table>   queue an update review
  delete  <employeeId>|<name>|<department>|<table>   queue an access revocation
  pending                                            list pending notifications
  search  [text][|<department>]                      filter IT accounts by text and department
  select  <notificationId>                           show the pre-filled setup form
  done    <notificationId> <systemId>                create the IT account and close the notification
  remove  <notificationId>                           drop a notification
  clear                                              drop every notification
  refresh | hide | show | help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Notify(EventKind, EmployeeFields),
    Pending,
    Search { query: String, department: Option<String> },
    Select(String),
    Done { notification_id: String, system_id: String },
    Remove(String),
    Clear,
    Refresh,
    Visibility(Visibility),
    Help,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EventKind {
    New,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct EmployeeFields {
    employee_id: String,
    name: String,
    department: String,
    table_number: String,
}

impl Command {
    fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let one_arg = |name: &str| -> Result<String, String> {
            if rest.is_empty() {
                Err(format!("usage: {} <notificationId>", name))
            } else {
                Ok(rest.to_string())
            }
        };

        match verb {
            "notify" => Ok(Command::Notify(EventKind::New, EmployeeFields::parse(rest)?)),
            "update" => Ok(Command::Notify(EventKind::Update, EmployeeFields::parse(rest)?)),
            "delete" => Ok(Command::Notify(EventKind::Delete, EmployeeFields::parse(rest)?)),
            "pending" | "ls" => Ok(Command::Pending),
            "search" | "find" => {
                let (query, department) = match rest.split_once('|') {
                    Some((query, department)) => (query.trim(), department.trim()),
                    None => (rest, ""),
                };
                Ok(Command::Search {
                    query: query.to_string(),
                    department: match department {
                        "" | "all" => None,
                        name => Some(name.to_string()),
                    },
                })
            }
            "select" => Ok(Command::Select(one_arg("select")?)),
            "remove" | "rm" => Ok(Command::Remove(one_arg("remove")?)),
            "done" | "complete" => match rest.split_whitespace().collect::<Vec<_>>().as_slice() {
                [notification_id, system_id] => Ok(Command::Done {
                    notification_id: notification_id.to_string(),
                    system_id: system_id.to_string(),
                }),
                _ => Err("usage: done <notificationId> <systemId>".to_string()),
            },
            "clear" => Ok(Command::Clear),
            "refresh" => Ok(Command::Refresh),
            "hide" => Ok(Command::Visibility(Visibility::Hidden)),
            "show" => Ok(Command::Visibility(Visibility::Visible)),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(format!("unknown command '{}', try 'help'", other)),
        }
    }
}

impl EmployeeFields {
    fn parse(args: &str) -> Result<Self, String> {
        let parts: Vec<&str> = args.split('|').map(str::trim).collect();
        match parts.as_slice() {
            [employee_id, name, department, table_number] => Ok(Self {
                employee_id: employee_id.to_string(),
                name: name.to_string(),
                department: department.to_string(),
                table_number: table_number.to_string(),
            }),
            _ => Err("expected <employeeId>|<name>|<department>|<table>".to_string()),
        }
    }
}

struct Console {
    store: Arc<NotificationStore>,
    producer: NotificationProducer,
    dashboard: Arc<Dashboard>,
    setup: SetupFlow,
    visibility: watch::Sender<Visibility>,
}

impl Console {
    async fn execute(&self, command: Command) -> anyhow::Result<()> {
        match command {
            Command::Notify(kind, f) => {
                let notify = match kind {
                    EventKind::New => NotificationProducer::notify_new_employee,
                    EventKind::Update => NotificationProducer::notify_employee_update,
                    EventKind::Delete => NotificationProducer::notify_employee_deleted,
                };
                let n = notify(
                    &self.producer,
                    &f.employee_id,
                    &f.name,
                    &f.department,
                    &f.table_number,
                )?;
                println!("queued {} ({})", n.id, n.message);
                self.dashboard.request_refresh();
            }
            Command::Pending => print_pending(&self.dashboard.snapshot(), &self.store),
            Command::Search { query, department } => {
                print_records(&self.dashboard.snapshot(), &query, department.as_deref())
            }
            Command::Select(id) => match self.dashboard.select(&id) {
                Some(draft) => println!("{}", serde_json::to_string_pretty(&draft)?),
                None => println!("no pending notification {}", id),
            },
            Command::Done { notification_id, system_id } => {
                let Some(draft) = self.dashboard.select(&notification_id) else {
                    println!("no pending notification {}", notification_id);
                    return Ok(());
                };
                let account = self
                    .setup
                    .complete_setup(&notification_id, draft.into_request(system_id))
                    .await?;
                println!("created IT account {} for {}", account.system_id, account.employee_name);
            }
            Command::Remove(id) => {
                self.store.remove(&id)?;
                self.dashboard.request_refresh();
            }
            Command::Clear => {
                self.store.clear()?;
                self.dashboard.request_refresh();
            }
            Command::Refresh => self.dashboard.request_refresh(),
            Command::Visibility(visibility) => {
                self.visibility.send_replace(visibility);
            }
            Command::Help => println!("{}", HELP),
            Command::Quit => {}
        }
        Ok(())
    }
}

fn print_pending(snapshot: &DashboardSnapshot, store: &NotificationStore) {
    // 快照可能落后于本地队列，未同步的条目按未开户处理
    let pending = it_desk::services::dashboard::reconcile(store.list_pending(), &snapshot.records);
    if pending.is_empty() {
        println!("no pending IT setups");
        return;
    }
    for item in pending {
        let n = &item.notification;
        println!(
            "{}  {:<16} {:<24} {:<16} table {:<6} {}{}",
            n.id,
            n.notification_type,
            n.employee_name,
            n.department,
            n.table_number,
            n.created_at.format("%Y-%m-%d %H:%M"),
            if item.has_account { "  [account exists]" } else { "" },
        );
    }
}

fn print_records(snapshot: &DashboardSnapshot, query: &str, department: Option<&str>) {
    let records = snapshot.filtered_records(query, department);
    if records.is_empty() {
        println!("no matching IT accounts");
        return;
    }
    for record in records {
        let emails: Vec<&str> = record.emails.iter().map(|e| e.email.as_str()).collect();
        println!(
            "{:<12} {:<24} {:<16} {}",
            record.system_id,
            record.employee_name,
            record.department.as_deref().unwrap_or("-"),
            emails.join(", "),
        );
    }
}

async fn report_snapshots(mut snapshots: watch::Receiver<DashboardSnapshot>, shutdown: CancellationToken) {
    let mut last_error: Option<String> = None;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                if snapshot.is_refreshing {
                    continue;
                }
                if snapshot.last_error != last_error {
                    match &snapshot.last_error {
                        Some(message) => warn!("{}", message),
                        None => info!("Backend reachable again"),
                    }
                    last_error = snapshot.last_error.clone();
                }
                info!(
                    "{} IT accounts, {} departments, {} pending setups",
                    snapshot.records.len(),
                    snapshot.departments.len(),
                    snapshot.pending.len()
                );
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("LOG_LEVEL").unwrap_or_else(|_| "it_desk=info,it_dashboard=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::from_env()?;
    info!(
        "IT dashboard against {} (queue in {})",
        config.api_base_url,
        config.notification_store_dir.display()
    );

    let store = Arc::new(NotificationStore::open_dir(&config.notification_store_dir));
    let api = ApiClient::new(&config.api_base_url, config.request_timeout())?;
    let dashboard = Arc::new(Dashboard::new(
        Arc::new(api.clone()),
        store.clone(),
        config.poll_interval(),
    ));
    let (visibility, visibility_rx) = watch::channel(Visibility::Visible);
    let console = Console {
        store: store.clone(),
        producer: NotificationProducer::new(store.clone()),
        dashboard: dashboard.clone(),
        setup: SetupFlow::new(api, store).with_dashboard(dashboard.clone()),
        visibility,
    };

    let shutdown = CancellationToken::new();
    let poller = tokio::spawn(dashboard.clone().run(visibility_rx, shutdown.clone()));
    let reporter = tokio::spawn(report_snapshots(dashboard.subscribe(), shutdown.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match Command::parse(&line) {
                    Ok(Command::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = console.execute(command).await {
                            error!("{}", e);
                        }
                    }
                    Err(message) => println!("{}", message),
                },
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read stdin: {}", e);
                    break;
                }
            }
        }
    }

    shutdown.cancel();
    poller.await?;
    reporter.await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_employee_events() {
        let command = Command::parse("notify e1|Alice Smith|Engineering|T12").unwrap();
        assert_eq!(
            command,
            Command::Notify(
                EventKind::New,
                EmployeeFields {
                    employee_id: "e1".into(),
                    name: "Alice Smith".into(),
                    department: "Engineering".into(),
                    table_number: "T12".into(),
                }
            )
        );
        assert!(Command::parse("delete e1|Alice").is_err());
    }

    #[test]
    fn parses_search_with_optional_department() {
        assert_eq!(
            Command::parse("search alice smith|Engineering").unwrap(),
            Command::Search {
                query: "alice smith".into(),
                department: Some("Engineering".into())
            }
        );
        assert_eq!(
            Command::parse("search vonage").unwrap(),
            Command::Search {
                query: "vonage".into(),
                department: None
            }
        );
        assert_eq!(
            Command::parse("search |all").unwrap(),
            Command::Search {
                query: "".into(),
                department: None
            }
        );
    }

    #[test]
    fn parses_setup_commands() {
        assert_eq!(
            Command::parse("done abc SYS-1").unwrap(),
            Command::Done {
                notification_id: "abc".into(),
                system_id: "SYS-1".into()
            }
        );
        assert!(Command::parse("done abc").is_err());
        assert!(Command::parse("select").is_err());
        assert_eq!(Command::parse("  hide ").unwrap(), Command::Visibility(Visibility::Hidden));
        assert!(Command::parse("frobnicate").is_err());
    }
}
