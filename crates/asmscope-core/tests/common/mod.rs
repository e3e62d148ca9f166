//! Shared helpers for integration tests: fake front-end compilers and
//! toolchains written as shell scripts.

#![allow(dead_code)]

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Write an executable script.
///
/// The file is written by a child `sh` so this process never holds a
/// writable descriptor to it, which would make a concurrent exec fail with
/// "text file busy".
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    let mut child = Command::new("sh")
        .arg("-c")
        .arg("cat > \"$0\" && chmod 755 \"$0\"")
        .arg(path)
        .stdin(Stdio::piped())
        .spawn()
        .expect("Failed to spawn sh");
    child
        .stdin
        .take()
        .expect("stdin")
        .write_all(body.as_bytes())
        .expect("Failed to write script");
    let status = child.wait().expect("Failed to wait for sh");
    assert!(status.success(), "writing {} failed", path.display());
    path.to_path_buf()
}

/// Front-end compiler stand-in.
///
/// Copies the source between two snapshot markers into `<stem>.s`, writes a
/// stack snapshot, fails without assembly when the source contains `FAIL`,
/// and prints a truncated memory graph in `--debug` mode.
pub const FAKE_COMPILER: &str = r##"#!/bin/sh
src="$1"
base="${src%.*}"
if [ "$2" = "--debug" ]; then
  echo "=== type check ==="
  echo "digraph MemoryFlow {"
  echo "  step0 [label=\"Start\"];"
  exit 0
fi
if grep -q FAIL "$src"; then
  echo "parsing $src"
  echo "syntax error near FAIL" >&2
  exit 1
fi
{
  echo "main:"
  echo " pushq %rbp"
  echo "# SNAPIDX 0 decl x line 1"
  cat "$src"
  echo "# SNAPIDX 1 line 2 line 2"
  echo " ret"
} > "$base.s"
printf '[{"label":"decl x","line":1,"idx":0,"vars":[{"name":"x","value":"5","offset":-8,"type":"int"}]}]' > "${base}_stack.json"
if grep -q LINEMAP "$src"; then
  printf '{"1":["structured"]}' > "${base}_stack.json.asm.json"
fi
exit 0
"##;

/// Native toolchain stand-in.
///
/// Invoked as `<asm> -o <exe>`; the produced executable runs every
/// `RUN `-prefixed line of the assembly as a shell command.
pub const FAKE_ASSEMBLER: &str = r##"#!/bin/sh
asm="$1"
out="$3"
if grep -q BADASM "$asm"; then
  echo "undefined symbol BADASM" >&2
  exit 1
fi
{
  echo '#!/bin/sh'
  sed -n 's/^RUN //p' "$asm"
} > "$out"
chmod 755 "$out"
"##;

/// Graph renderer stand-in.
///
/// Invoked as `-Tpng <graph> -o <image>`; the "image" is a copy of the graph.
pub const FAKE_RENDERER: &str = r##"#!/bin/sh
cp "$2" "$4"
"##;

/// Toolchain stand-in for compiler builds; logs every build next to the
/// output binary.
pub const FAKE_TOOLCHAIN: &str = r##"#!/bin/sh
while [ $# -gt 0 ]; do
  if [ "$1" = "-o" ]; then out="$2"; fi
  shift
done
echo built >> "$(dirname "$out")/builds.log"
printf '#!/bin/sh\n' > "$out"
"##;

/// Toolchain stand-in that always rejects its input.
pub const FAILING_TOOLCHAIN: &str = r##"#!/bin/sh
echo "main.cpp:3:1: error: expected ';'" >&2
exit 1
"##;
