//! Logical path computation.
//!
//! Every file in the collection is keyed by a *logical path*: the path of the
//! source file relative to the source root, with `/` separators and no leading
//! separator. The same key, joined onto the destination root, is where the
//! file is written.
//!
//! All functions here are lexical. They never touch the filesystem, so
//! symlinks are not resolved.

/// Lexically clean a slash-separated path.
///
/// - Repeated separators collapse: `a//b` → `a/b`
/// - `.` segments are dropped: `a/./b` → `a/b`
/// - `..` removes the preceding segment: `a/b/../c` → `a/c`
/// - `..` at the start of a rooted path is dropped: `/../a` → `/a`
/// - `..` at the start of a relative path is kept: `../a` → `../a`
/// - Trailing separators are removed except for the root itself: `a/` → `a`, `/` → `/`
/// - An empty result stays empty (`""`, `"."`, and `"a/.."` all give `""`)
pub fn clean(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    if rooted {
        format!("/{joined}")
    } else {
        joined
    }
}

/// Compute the logical path of `path` under `root`.
///
/// The root prefix is removed when `path` lies under it (compared on whole
/// segments, so `/src` is not a prefix of `/srcs/a`), then one leading `/`
/// is stripped and the result is cleaned.
///
/// - `normalize("/a/b/c/d", "/a/b/c")` → `"d"`
/// - `normalize("/d", "")` → `"d"`
/// - `normalize("/d", "/")` → `"d"`
/// - `normalize("a/b//d", "a")` → `"b/d"`
pub fn normalize(path: &str, root: &str) -> String {
    let path = clean(path);
    let root = clean(root);

    let relative = strip_root(&path, &root).unwrap_or(&path);
    let relative = relative.strip_prefix('/').unwrap_or(relative);

    let cleaned = clean(relative);
    // A relative path can only re-acquire a leading slash if it was `//x`.
    cleaned.trim_start_matches('/').to_string()
}

fn strip_root<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    if root.is_empty() {
        return None;
    }
    if root == "/" {
        return Some(path);
    }
    let rest = path.strip_prefix(root)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

/// Convert an OS path to a slash-separated string.
pub fn to_slash(path: &std::path::Path) -> String {
    let s = path.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}

/// `true` if `logical` would stay inside the root it is joined onto.
pub fn is_contained(logical: &str) -> bool {
    !logical.is_empty()
        && !logical.starts_with('/')
        && logical.split('/').all(|segment| segment != "..")
}
