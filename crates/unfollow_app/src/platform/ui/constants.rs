/// Candidate rows shown before the list is summarised.
pub const MAX_CANDIDATE_ROWS: usize = 20;

/// Alert log entries shown when the log is open.
pub const MAX_ALERT_ROWS: usize = 15;

pub const RULE: &str = "------------------------------------------------------------";

pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

pub const HELP_TEXT: &str = "\
Commands:
  load <path>             add usernames from a CSV / text file
  paste <names...>        add usernames separated by spaces or commas
  add <name>              add a single username
  select <name|all|none>  change the selection
  unselect <name>         deselect one username
  clear                   empty the candidate list
  batch                   unfollow the selection (max 1000, 15 min apart)
  slow <minutes>          slow batch (max 100) at the given interval
  yes / no                answer the pending question
  refresh                 check account and operations now
  details <id>            show operation details (close to hide)
  cancel <id>             cancel an operation
  clear-batches           drop every batch operation on the server
  token                   refresh the authentication token
  log                     show or hide the alert log
  quit                    exit";
