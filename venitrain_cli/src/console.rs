//! Operator console grammar: one command per stdin line.

use venitrain_core::{AutoContinue, Command, Control};

pub const HELP: &str = "\
commands:
  complete <step>   mark a step completed (current step only)
  fail <step>       mark a step failed (current step only)
  skip <step>       mark a step skipped
  back <step>       return to the step before <step>
  continue | next   restart the countdown, or complete the current step
  toggle <sub-id>   tick or untick a checklist item (e.g. 2-b)
  auto <0|10|20|30> set auto-continue
  start | pause     start or pause recording
  reset             start the session over
  clear             clear the raw line echo
  connect | disconnect
  status            print the session state
  quit";

/// What one console line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Control(Control),
    Help,
    Empty,
}

fn step_arg(verb: &str, arg: Option<&str>) -> Result<u8, String> {
    let raw = arg.ok_or_else(|| format!("`{verb}` needs a step number"))?;
    raw.parse::<u8>()
        .map_err(|_| format!("`{raw}` is not a step number"))
}

/// Parse one console line. Words are case-insensitive; extra words are an error.
pub fn parse_input(line: &str) -> Result<Input, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(Input::Empty);
    };
    let verb = verb.to_ascii_lowercase();
    let arg = words.next();
    if let Some(extra) = words.next() {
        return Err(format!("unexpected `{extra}`"));
    }
    let takes_arg = matches!(
        verb.as_str(),
        "complete" | "fail" | "skip" | "back" | "toggle" | "auto"
    );
    if !takes_arg && let Some(a) = arg {
        return Err(format!("`{verb}` takes no argument, got `{a}`"));
    }

    let session = |c| Ok(Input::Control(Control::Session(c)));
    match verb.as_str() {
        "complete" => session(Command::Complete(step_arg(&verb, arg)?)),
        "fail" => session(Command::Fail(step_arg(&verb, arg)?)),
        "skip" => session(Command::Skip(step_arg(&verb, arg)?)),
        "back" => session(Command::Back(step_arg(&verb, arg)?)),
        "continue" | "next" => session(Command::Continue),
        "toggle" => {
            let id = arg.ok_or("`toggle` needs a checklist item id")?;
            session(Command::ToggleSubStep(id.to_ascii_lowercase()))
        }
        "auto" => {
            let secs = arg
                .ok_or("`auto` needs 0, 10, 20 or 30")?
                .parse::<u64>()
                .map_err(|_| "`auto` needs 0, 10, 20 or 30".to_string())?;
            let setting = AutoContinue::try_from(secs).map_err(|e| e.to_string())?;
            session(Command::SetAutoContinue(setting))
        }
        "start" => session(Command::StartRecording),
        "pause" => session(Command::PauseRecording),
        "reset" => session(Command::Reset),
        "clear" => Ok(Input::Control(Control::ClearRawLines)),
        "connect" => Ok(Input::Control(Control::Connect)),
        "disconnect" => Ok(Input::Control(Control::Disconnect)),
        "status" => Ok(Input::Control(Control::Status)),
        "quit" | "exit" | "q" => Ok(Input::Control(Control::Quit)),
        "help" | "?" => Ok(Input::Help),
        other => Err(format!("unknown command `{other}` (try `help`)")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("complete 1", Control::Session(Command::Complete(1)))]
    #[case("FAIL 3", Control::Session(Command::Fail(3)))]
    #[case("  skip   2 ", Control::Session(Command::Skip(2)))]
    #[case("back 5", Control::Session(Command::Back(5)))]
    #[case("next", Control::Session(Command::Continue))]
    #[case("toggle 2-B", Control::Session(Command::ToggleSubStep("2-b".into())))]
    #[case("auto 20", Control::Session(Command::SetAutoContinue(AutoContinue::Secs20)))]
    #[case("auto 0", Control::Session(Command::SetAutoContinue(AutoContinue::Off)))]
    #[case("start", Control::Session(Command::StartRecording))]
    #[case("pause", Control::Session(Command::PauseRecording))]
    #[case("reset", Control::Session(Command::Reset))]
    #[case("clear", Control::ClearRawLines)]
    #[case("disconnect", Control::Disconnect)]
    #[case("status", Control::Status)]
    #[case("q", Control::Quit)]
    fn accepted_lines(#[case] line: &str, #[case] expected: Control) {
        assert_eq!(parse_input(line), Ok(Input::Control(expected)));
    }

    #[rstest]
    #[case("complete", "needs a step number")]
    #[case("complete one", "not a step number")]
    #[case("complete 300", "not a step number")]
    #[case("auto 25", "auto-continue must be")]
    #[case("status now", "takes no argument")]
    #[case("skip 1 2", "unexpected")]
    #[case("dance", "unknown command")]
    fn rejected_lines(#[case] line: &str, #[case] needle: &str) {
        let err = parse_input(line).unwrap_err();
        assert!(err.contains(needle), "{err}");
    }

    #[test]
    fn blank_and_help() {
        assert_eq!(parse_input("   "), Ok(Input::Empty));
        assert_eq!(parse_input("help"), Ok(Input::Help));
    }

    #[test]
    fn out_of_range_steps_reach_the_session() {
        // Range checking belongs to the session so the error is reported uniformly.
        assert_eq!(
            parse_input("complete 9"),
            Ok(Input::Control(Control::Session(Command::Complete(9))))
        );
    }
}
