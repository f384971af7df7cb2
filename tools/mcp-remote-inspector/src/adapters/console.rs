//! Line-oriented front end. Reads operator commands, dispatches them into the
//! [`InspectorService`] for the active transport, and prints session state.

use anyhow::{Context, Result, anyhow, bail};
use std::{fmt::Write as _, io::Write, str::FromStr};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::{
    app::inspector_service::{CallOutcome, ConnectOutcome, InspectorService, ListOutcome},
    domain::session::SessionSnapshot,
    shared::types::TransportKind,
};

pub const RESULT_PLACEHOLDER: &str = "[Tool call result will appear here]";

const HELP: &str = "\
commands:
  transport [sse|http]   show or switch the active transport
  url <server-url>       edit the server url for the active transport
  connect                connect with the edited url and list tools
  list                   refresh the tool catalog
  tools                  show the catalog
  select <n|none>        select a tool by index
  params                 show parameters of the selected tool
  set <key>=<value>      set one parameter
  call                   invoke the selected tool
  result                 show the last result
  status                 show the active session
  metrics                show operation metrics
  quit                   leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Transport(Option<TransportKind>),
    Url(String),
    Connect,
    List,
    Tools,
    Select(Option<usize>),
    Params,
    Set { key: String, value: String },
    Call,
    Result,
    Status,
    Metrics,
    Quit,
}

impl FromStr for Command {
    type Err = anyhow::Error;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (verb, rest) = line
            .split_once(char::is_whitespace)
            .map(|(verb, rest)| (verb, rest.trim()))
            .unwrap_or((line, ""));
        let command = match verb.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "transport" if rest.is_empty() => Command::Transport(None),
            "transport" => Command::Transport(Some(rest.parse()?)),
            "url" if rest.is_empty() => bail!("usage: url <server-url>"),
            "url" => Command::Url(rest.to_string()),
            "connect" => Command::Connect,
            "list" => Command::List,
            "tools" => Command::Tools,
            "select" if rest.eq_ignore_ascii_case("none") || rest == "-1" => Command::Select(None),
            "select" => Command::Select(Some(
                rest.parse()
                    .with_context(|| format!("'{}' is not a tool index", rest))?,
            )),
            "params" => Command::Params,
            "set" => {
                let (key, value) = rest
                    .split_once('=')
                    .ok_or_else(|| anyhow!("usage: set <key>=<value>"))?;
                let key = key.trim();
                if key.is_empty() {
                    bail!("parameter key must not be empty");
                }
                Command::Set {
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            "call" => Command::Call,
            "result" => Command::Result,
            "status" => Command::Status,
            "metrics" => Command::Metrics,
            "quit" | "exit" => Command::Quit,
            other => bail!("unknown command '{}'; try 'help'", other),
        };
        Ok(command)
    }
}

pub struct Console {
    service: InspectorService,
}

impl Console {
    pub fn new(service: InspectorService) -> Self {
        Self { service }
    }

    pub async fn run<R, W>(&self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "{}", render_status(&self.active_snapshot()))?;
        let mut lines = input.lines();
        loop {
            write!(out, "{}> ", self.service.active_transport())?;
            out.flush()?;
            let Some(line) = lines.next_line().await.context("read command")? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(err) => {
                    writeln!(out, "error: {err}")?;
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            let text = self.execute(command).await?;
            writeln!(out, "{text}")?;
        }
        Ok(())
    }

    pub async fn execute(&self, command: Command) -> Result<String> {
        let kind = self.service.active_transport();
        let text = match command {
            Command::Help => HELP.to_string(),
            Command::Transport(None) => render_status(&self.active_snapshot()),
            Command::Transport(Some(next)) => {
                self.service.switch_transport(next);
                render_status(&self.active_snapshot())
            }
            Command::Url(url) => {
                self.service.set_candidate_url(kind, url);
                "url set; 'connect' to use it".to_string()
            }
            Command::Connect => {
                self.service.apply_candidate_url(kind);
                let outcome = self.service.connect(kind).await;
                let snapshot = self.service.snapshot(kind);
                match outcome {
                    ConnectOutcome::MissingUrl => "no server url configured".to_string(),
                    ConnectOutcome::Busy => "connect already in progress".to_string(),
                    ConnectOutcome::InvalidUrl(err) | ConnectOutcome::Failed(err) => {
                        format!("{}\n{}", render_status(&snapshot), err)
                    }
                    ConnectOutcome::Connected { .. } => {
                        format!("{}\n{}", render_status(&snapshot), render_tools(&snapshot))
                    }
                }
            }
            Command::List => match self.service.list_tools(kind).await {
                ListOutcome::NotConnected => "not connected".to_string(),
                ListOutcome::Busy => "tool listing already in progress".to_string(),
                ListOutcome::Failed(err) => format!("listing failed: {err}"),
                ListOutcome::Stale => "catalog discarded after reconnect".to_string(),
                ListOutcome::Loaded { .. } | ListOutcome::Rejected(_) => {
                    render_tools(&self.service.snapshot(kind))
                }
            },
            Command::Tools => render_tools(&self.service.snapshot(kind)),
            Command::Select(index) => {
                self.service.select_tool(kind, index);
                self.render_params(kind)
            }
            Command::Params => self.render_params(kind),
            Command::Set { key, value } => {
                self.service.set_parameter(kind, key, value);
                self.render_params(kind)
            }
            Command::Call => match self.service.call_tool(kind).await {
                CallOutcome::Busy => "call already in progress".to_string(),
                CallOutcome::Stale(_) => "result discarded after reconnect".to_string(),
                CallOutcome::NoToolSelected
                | CallOutcome::Completed(_)
                | CallOutcome::Failed(_) => render_result(&self.service.snapshot(kind)),
            },
            Command::Result => render_result(&self.service.snapshot(kind)),
            Command::Status => render_status(&self.service.snapshot(kind)),
            Command::Metrics => self.service.metrics_report()?,
            Command::Quit => String::new(),
        };
        Ok(text)
    }

    fn active_snapshot(&self) -> SessionSnapshot {
        self.service.snapshot(self.service.active_transport())
    }

    fn render_params(&self, kind: TransportKind) -> String {
        let snapshot = self.service.snapshot(kind);
        let Some(tool) = snapshot.selected_descriptor() else {
            return "no tool selected".to_string();
        };
        let mut text = tool.name.clone();
        if let Some(description) = &tool.description {
            let _ = write!(text, "\n  {description}");
        }
        let fields = self.service.parameter_fields(kind);
        if fields.is_empty() {
            text.push_str("\n  (no parameters)");
        }
        for field in fields {
            let marker = if field.required { "*" } else { "" };
            let _ = write!(text, "\n  {}{}: {:?}", field.key, marker, field.value);
            if let Some(description) = field.description {
                let _ = write!(text, "  ({description})");
            }
        }
        text
    }
}

pub fn render_status(snapshot: &SessionSnapshot) -> String {
    let mut status = snapshot.status_label().to_string();
    if snapshot.connecting {
        status.push_str(", connecting");
    }
    if snapshot.list_loading {
        status.push_str(", listing tools");
    }
    if snapshot.call_in_progress {
        status.push_str(", calling");
    }
    let mut text = format!(
        "[{}] {} | {}",
        snapshot.kind.label(),
        snapshot.server_url,
        status
    );
    if snapshot.candidate_url != snapshot.server_url {
        let _ = write!(text, "\n  edited url: {}", snapshot.candidate_url);
    }
    text
}

pub fn render_tools(snapshot: &SessionSnapshot) -> String {
    if snapshot.tools.is_empty() {
        return "no tools".to_string();
    }
    let mut text = String::new();
    for (index, tool) in snapshot.tools.iter().enumerate() {
        let marker = if snapshot.selected_tool == Some(index) {
            ">"
        } else {
            " "
        };
        let _ = write!(text, "{marker} {index:>2}  {}", tool.name);
        if let Some(description) = &tool.description {
            let summary = description.lines().next().unwrap_or_default();
            let _ = write!(text, "  {summary}");
        }
        text.push('\n');
    }
    text.pop();
    text
}

pub fn render_result(snapshot: &SessionSnapshot) -> String {
    if snapshot.last_result.is_empty() {
        RESULT_PLACEHOLDER.to_string()
    } else {
        snapshot.last_result.clone()
    }
}
