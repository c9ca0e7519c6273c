//! Resolution of the raw command line into a typed [`Invocation`].
//!
//! lemonade can be started in two shapes:
//!
//! ```text
//! lemonade [options] copy "some text"     # explicit subcommand
//! pbcopy   [options] "some text"          # alias: the binary name is the action
//! ```
//!
//! [`resolve_command`] figures out which action was meant and hands the rest of
//! the argument vector to the flag layer.  The flag layer then picks the
//! payload via [`Invocation::from_parts`].

use std::io::{self, Read};

use thiserror::Error;

/// Help text printed for `--help` and attached to [`ResolveError::UnknownCommand`].
pub const USAGE: &str = concat!(
    "Usage: lemonade [options]... SUB_COMMAND [arg]\n",
    "Sub Commands:\n",
    "  open [URL]                  Open URL by browser\n",
    "  copy [text]                 Copy text.\n",
    "  paste                       Paste text.\n",
    "  server                      Start lemonade server.\n",
    "\n",
    "Options:\n",
    "  --port=2489                 TCP port number\n",
    "  --line-ending               Convert Line Ending (LF/CRLF)\n",
    "  --allow=\"0.0.0.0/0,::/0\"    Allow IP Range                [Server only]\n",
    "  --host=\"localhost\"          Destination hostname          [Client only]\n",
    "  --no-fallback-messages      Do not show fallback messages [Client only]\n",
    "  --trans-loopback=true       Translate loopback address    [open subcommand only]\n",
    "  --trans-localfile=true      Translate local file path     [open subcommand only]\n",
    "  --file-timeout=30           Seconds to wait for a file fetch [open subcommand only]\n",
    "  --log-level=1               Log level                     [4 = Critical, 0 = Debug]\n",
    "  --help                      Show this message\n",
    "\n",
    "\n",
    "Version:\n  ",
    env!("CARGO_PKG_VERSION"),
    "\n",
);

/// The action the user asked lemonade to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Open a URL (or an exposed local file) in the desktop browser.
    Open,
    /// Put text on the desktop clipboard.
    Copy,
    /// Read text from the desktop clipboard.
    Paste,
    /// Run the endpoint.
    Serve,
}

impl Action {
    /// Returns `true` when the action carries a payload (URL or text).
    pub fn takes_payload(self) -> bool {
        matches!(self, Action::Open | Action::Copy)
    }

    fn from_subcommand(token: &str) -> Option<Self> {
        match token {
            "open" => Some(Action::Open),
            "copy" => Some(Action::Copy),
            "paste" => Some(Action::Paste),
            "server" => Some(Action::Serve),
            _ => None,
        }
    }
}

/// How the action was selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStyle {
    /// The binary was invoked under an alias name such as `pbcopy`.
    Alias,
    /// An explicit subcommand token such as `copy` was present.
    Subcommand,
}

/// Errors produced while resolving the command line.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Neither an alias name nor a subcommand token was found.
    #[error("Unknown SubCommand\n\n{usage}")]
    UnknownCommand { usage: &'static str },
}

/// Output of [`resolve_command`]: the action plus the arguments left for the
/// flag layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub action: Action,
    pub style: CommandStyle,
    /// Argument vector with the subcommand token removed.  Element 0 is still
    /// the program name so it can be handed directly to a flag parser.
    pub args: Vec<String>,
}

/// Alias basenames and the action each one impersonates.
const ALIASES: [(&str, Action); 3] = [
    ("xdg-open", Action::Open),
    ("pbpaste", Action::Paste),
    ("pbcopy", Action::Copy),
];

/// Resolves which action `args` (the full `argv`, program name included)
/// asks for.
///
/// 1. If `args[0]` ends in one of the alias names (`xdg-open`, `pbpaste`,
///    `pbcopy`) the action follows from it and `args` is returned untouched.
/// 2. Otherwise the first of `args[1..]` equal to `open`, `copy`, `paste` or
///    `server` selects the action and is dropped from the returned vector.
///
/// # Errors
///
/// Returns [`ResolveError::UnknownCommand`] when neither rule matches,
/// including for an empty `args`.
///
/// # Examples
///
/// ```rust
/// use lemonade_core::{resolve_command, Action};
///
/// let args: Vec<String> = ["lemonade", "copy", "hello"].iter().map(|s| s.to_string()).collect();
/// let resolved = resolve_command(&args).unwrap();
/// assert_eq!(resolved.action, Action::Copy);
/// assert_eq!(resolved.args, vec!["lemonade".to_string(), "hello".to_string()]);
/// ```
pub fn resolve_command(args: &[String]) -> Result<ResolvedCommand, ResolveError> {
    let unknown = ResolveError::UnknownCommand { usage: USAGE };
    let program = args.first().ok_or_else(|| unknown.clone())?;

    if let Some(&(_, action)) = ALIASES.iter().find(|(name, _)| program.ends_with(*name)) {
        return Ok(ResolvedCommand {
            action,
            style: CommandStyle::Alias,
            args: args.to_vec(),
        });
    }

    let (position, action) = args
        .iter()
        .enumerate()
        .skip(1)
        .find_map(|(i, token)| Action::from_subcommand(token).map(|a| (i, a)))
        .ok_or(unknown)?;

    // Build a fresh vector without the subcommand instead of shifting in place.
    let remaining = args
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != position)
        .map(|(_, token)| token.clone())
        .collect();

    Ok(ResolvedCommand {
        action,
        style: CommandStyle::Subcommand,
        args: remaining,
    })
}

/// A fully resolved request: what to do, on what, and how.
///
/// Built once per process run and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub action: Action,
    /// URL or path for `open`, text for `copy`, empty for `paste` and `server`.
    pub payload: String,
    /// Serve an existing local file over HTTP instead of sending its path.
    pub trans_localfile: bool,
    /// Ask the endpoint to rewrite loopback hosts to the caller's address.
    pub trans_loopback: bool,
}

impl Invocation {
    /// Builds an invocation from the positional arguments the flag layer left
    /// over.
    ///
    /// The first positional becomes the payload.  When there is none, the
    /// payload is read in full from `input` (normally stdin).  `paste` and
    /// `server` never read a payload.
    ///
    /// # Errors
    ///
    /// Returns any I/O error raised while reading `input`, or
    /// [`io::ErrorKind::InvalidData`] when it is not UTF-8.
    pub fn from_parts<R: Read>(
        action: Action,
        positionals: &[String],
        trans_localfile: bool,
        trans_loopback: bool,
        input: &mut R,
    ) -> io::Result<Self> {
        let payload = if !action.takes_payload() {
            String::new()
        } else if let Some(first) = positionals.first() {
            first.clone()
        } else {
            let mut buf = String::new();
            input.read_to_string(&mut buf)?;
            buf
        };

        Ok(Self {
            action,
            payload,
            trans_localfile,
            trans_loopback,
        })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_xdg_open_alias_resolves_to_open_without_removing_tokens() {
        // Arrange
        let args = argv(&["xdg-open", "http://example.com"]);

        // Act
        let resolved = resolve_command(&args).unwrap();

        // Assert
        assert_eq!(resolved.action, Action::Open);
        assert_eq!(resolved.style, CommandStyle::Alias);
        assert_eq!(resolved.args, args);
    }

    #[test]
    fn test_alias_with_directory_prefix_is_recognised() {
        let resolved = resolve_command(&argv(&["/usr/local/bin/pbcopy"])).unwrap();
        assert_eq!(resolved.action, Action::Copy);
    }

    #[test]
    fn test_pbpaste_alias_resolves_to_paste() {
        let resolved = resolve_command(&argv(&["pbpaste", "--line-ending=lf"])).unwrap();
        assert_eq!(resolved.action, Action::Paste);
        assert_eq!(resolved.args.len(), 2);
    }

    #[test]
    fn test_alias_wins_over_subcommand_token() {
        // `pbcopy open` copies the word "open"; it is not the open subcommand.
        let resolved = resolve_command(&argv(&["pbcopy", "open"])).unwrap();
        assert_eq!(resolved.action, Action::Copy);
        assert_eq!(resolved.args, argv(&["pbcopy", "open"]));
    }

    #[test]
    fn test_copy_subcommand_is_removed_and_payload_shifts_left() {
        // Arrange
        let args = argv(&["lemonade", "copy", "hello"]);

        // Act
        let resolved = resolve_command(&args).unwrap();

        // Assert
        assert_eq!(resolved.action, Action::Copy);
        assert_eq!(resolved.style, CommandStyle::Subcommand);
        assert_eq!(resolved.args, argv(&["lemonade", "hello"]));
    }

    #[test]
    fn test_subcommand_after_flags_is_found() {
        let resolved =
            resolve_command(&argv(&["lemonade", "--host=10.0.0.1", "paste"])).unwrap();
        assert_eq!(resolved.action, Action::Paste);
        assert_eq!(resolved.args, argv(&["lemonade", "--host=10.0.0.1"]));
    }

    #[test]
    fn test_only_first_subcommand_token_is_removed() {
        let resolved = resolve_command(&argv(&["lemonade", "copy", "paste"])).unwrap();
        assert_eq!(resolved.action, Action::Copy);
        assert_eq!(resolved.args, argv(&["lemonade", "paste"]));
    }

    #[test]
    fn test_subcommand_in_last_position_does_not_panic() {
        let resolved = resolve_command(&argv(&["lemonade", "server"])).unwrap();
        assert_eq!(resolved.action, Action::Serve);
        assert_eq!(resolved.args, argv(&["lemonade"]));
    }

    #[test]
    fn test_unknown_subcommand_fails_with_usage() {
        // Act
        let result = resolve_command(&argv(&["lemonade", "frobnicate"]));

        // Assert
        let err = result.unwrap_err();
        assert_eq!(err, ResolveError::UnknownCommand { usage: USAGE });
        assert!(err.to_string().contains("Usage: lemonade"));
    }

    #[test]
    fn test_program_name_alone_is_unknown_command() {
        assert!(resolve_command(&argv(&["lemonade"])).is_err());
    }

    #[test]
    fn test_empty_argv_is_unknown_command() {
        assert!(resolve_command(&[]).is_err());
    }

    #[test]
    fn test_subcommand_name_as_program_is_not_a_subcommand() {
        // Element 0 is never scanned for subcommand tokens.
        assert!(resolve_command(&argv(&["copy"])).is_err());
    }

    #[test]
    fn test_from_parts_uses_first_positional_as_payload() {
        let mut stdin: &[u8] = b"ignored";
        let inv = Invocation::from_parts(
            Action::Copy,
            &argv(&["hello", "world"]),
            true,
            true,
            &mut stdin,
        )
        .unwrap();
        assert_eq!(inv.payload, "hello");
    }

    #[test]
    fn test_from_parts_reads_stdin_when_no_positional() {
        // Arrange
        let mut stdin: &[u8] = b"piped text\n";

        // Act
        let inv = Invocation::from_parts(Action::Copy, &[], true, true, &mut stdin).unwrap();

        // Assert
        assert_eq!(inv.payload, "piped text\n");
    }

    #[test]
    fn test_from_parts_paste_never_reads_stdin() {
        let mut stdin: &[u8] = b"should not be read";
        let inv = Invocation::from_parts(Action::Paste, &[], true, true, &mut stdin).unwrap();
        assert!(inv.payload.is_empty());
        assert_eq!(stdin.len(), "should not be read".len());
    }

    #[test]
    fn test_from_parts_rejects_non_utf8_stdin() {
        let mut stdin: &[u8] = &[0xff, 0xfe, 0xfd];
        let err = Invocation::from_parts(Action::Copy, &[], true, true, &mut stdin).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_takes_payload() {
        assert!(Action::Open.takes_payload());
        assert!(Action::Copy.takes_payload());
        assert!(!Action::Paste.takes_payload());
        assert!(!Action::Serve.takes_payload());
    }
}
