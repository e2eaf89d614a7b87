//! Server-rendered HTML. Every interpolated value goes through [`escape`].

use baas_client::{encode_component, TodoItem, User};

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="en">
<head><meta charset="utf-8"><title>{title}</title></head>
<body>
{body}
</body>
</html>
"#,
        title = escape(title),
    )
}

fn notice(error: Option<&str>) -> String {
    error
        .map(|msg| format!(r#"<p class="error">{}</p>"#, escape(msg)))
        .unwrap_or_default()
}

pub fn sign_in_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Sign in</h1>
{notice}
<form method="post" action="/sign-in">
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" required></label>
  <button type="submit">Sign in</button>
</form>
<p>No account? <a href="/sign-up">Sign up</a></p>"#,
        notice = notice(error),
    );
    layout("Sign in", &body)
}

pub fn sign_up_page(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Sign up</h1>
{notice}
<form method="post" action="/sign-up">
  <label>Name <input type="text" name="name"></label>
  <label>Email <input type="email" name="email" required></label>
  <label>Password <input type="password" name="password" minlength="8" required></label>
  <button type="submit">Create account</button>
</form>
<p>Already registered? <a href="/sign-in">Sign in</a></p>"#,
        notice = notice(error),
    );
    layout("Sign up", &body)
}

fn todo_row(todo: &TodoItem) -> String {
    let id = escape(&todo.id);
    let segment = escape(&encode_component(&todo.id));
    let checked = if todo.is_completed { " checked" } else { "" };
    format!(
        r#"<li data-id="{id}">
  <form method="post" action="/todos/{segment}">
    <input type="checkbox" name="isCompleted"{checked}>
    <input type="text" name="title" value="{title}">
    <button type="submit">Save</button>
  </form>
  <form method="post" action="/todos/{segment}/delete"><button type="submit">Delete</button></form>
  <time datetime="{created}">{created}</time>
</li>"#,
        title = escape(&todo.title),
        created = todo.created_at.to_rfc3339(),
    )
}

pub fn todos_page(user: &User, todos: &[TodoItem]) -> String {
    let display = if user.name.is_empty() { &user.email } else { &user.name };
    let rows: String = todos.iter().map(todo_row).collect::<Vec<_>>().join("\n");
    let list = if todos.is_empty() {
        "<p>Nothing to do.</p>".to_string()
    } else {
        format!("<ul>\n{rows}\n</ul>")
    };
    let body = format!(
        r#"<h1>Todos</h1>
<p>Signed in as {who}.</p>
<form method="post" action="/sign-out"><button type="submit">Sign out</button></form>
<form method="post" action="/todos">
  <input type="text" name="title" required>
  <button type="submit">Add</button>
</form>
{list}"#,
        who = escape(display),
    );
    layout("Todos", &body)
}

pub fn error_page(message: &str) -> String {
    let body = format!(
        r#"<h1>Something went wrong</h1>
<p>{}</p>
<p><a href="/">Back</a></p>"#,
        escape(message)
    );
    layout("Error", &body)
}
