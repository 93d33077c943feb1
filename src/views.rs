//! Server-rendered HTML pages.

use std::fmt::Write;

use crate::{flash::Flash, users::search::SearchParams, users::User};

pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, flash: Option<Flash>, body: &str) -> String {
    let notice = flash
        .map(|f| format!(r#"<p class="flash">{}</p>"#, escape(f.message())))
        .unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="utf-8"><title>{title} - RivalTeamFinder</title></head>
<body>
<nav><a href="/">Home</a> | <a href="/buscar">Search</a> | <a href="/perfil">Profile</a> | <a href="/usuarios">Users</a></nav>
{notice}
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

pub fn index_page(flash: Option<Flash>) -> String {
    layout(
        "RivalTeamFinder",
        flash,
        r#"<p>Find rivals near you by location, skill, age, gender and sport.</p>
<p><a href="/register">Register</a> or <a href="/login">log in</a>.</p>"#,
    )
}

pub fn register_page(error: Option<&str>) -> String {
    let error = error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default();
    layout(
        "Register",
        None,
        &format!(
            r#"{error}
<form method="post" action="/registrar">
<label>Name <input name="name" required></label>
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<label>Skill <input name="skill" required></label>
<label>Location <input name="location" required></label>
<label>Age <input name="age" type="number" min="0" max="150"></label>
<label>Gender <input name="gender"></label>
<label>Sport <input name="sport"></label>
<button type="submit">Register</button>
</form>"#
        ),
    )
}

pub fn login_page(flash: Option<Flash>) -> String {
    layout(
        "Log in",
        flash,
        r#"<form method="post" action="/iniciar_sesion">
<label>Email <input name="email" type="email" required></label>
<label>Password <input name="password" type="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register">Register</a></p>"#,
    )
}

fn user_rows(users: &[User], with_delete: bool) -> String {
    let mut rows = String::new();
    for u in users {
        let _ = write!(
            rows,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>",
            u.id,
            escape(&u.name),
            escape(&u.email),
            escape(&u.skill),
            escape(&u.location),
            u.age.map(|a| a.to_string()).unwrap_or_default(),
            escape(u.gender.as_deref().unwrap_or("")),
            escape(u.sport.as_deref().unwrap_or("")),
        );
        if with_delete {
            let _ = write!(rows, r#"<td><a href="/eliminar/{}">Delete</a></td>"#, u.id);
        }
        rows.push_str("</tr>\n");
    }
    rows
}

fn user_table(users: &[User], with_delete: bool) -> String {
    if users.is_empty() {
        return "<p>No users found.</p>".to_string();
    }
    format!(
        "<table>\n<tr><th>ID</th><th>Name</th><th>Email</th><th>Skill</th><th>Location</th><th>Age</th><th>Gender</th><th>Sport</th>{}</tr>\n{}</table>",
        if with_delete { "<th></th>" } else { "" },
        user_rows(users, with_delete),
    )
}

/// Search form, pre-filled with `params`; `results` is `None` before the first search.
pub fn search_page(params: &SearchParams, results: Option<&[User]>) -> String {
    let value = |v: &Option<String>| escape(v.as_deref().unwrap_or(""));
    let mut body = format!(
        r#"<form method="get" action="/buscar_rivales">
<label>Location <input name="location" value="{}"></label>
<label>Skill <input name="skill" value="{}"></label>
<label>Age <input name="age" value="{}"></label>
<label>Gender <input name="gender" value="{}"></label>
<label>Sport <input name="sport" value="{}"></label>
<button type="submit">Search</button>
</form>"#,
        value(&params.location),
        value(&params.skill),
        value(&params.age),
        value(&params.gender),
        value(&params.sport),
    );
    if let Some(results) = results {
        body.push_str("\n<h2>Results</h2>\n");
        body.push_str(&user_table(results, false));
    }
    layout("Search rivals", None, &body)
}

pub fn profile_page(user: &User, flash: Option<Flash>) -> String {
    let optional = |label: &str, v: Option<String>| {
        v.map(|v| format!("<dt>{}</dt><dd>{}</dd>", label, escape(&v)))
            .unwrap_or_default()
    };
    layout(
        "Profile",
        flash,
        &format!(
            r#"<dl>
<dt>Name</dt><dd>{}</dd>
<dt>Email</dt><dd>{}</dd>
<dt>Skill</dt><dd>{}</dd>
<dt>Location</dt><dd>{}</dd>
{}{}{}</dl>
<p><a href="/logout">Log out</a></p>"#,
            escape(&user.name),
            escape(&user.email),
            escape(&user.skill),
            escape(&user.location),
            optional("Age", user.age.map(|a| a.to_string())),
            optional("Gender", user.gender.clone()),
            optional("Sport", user.sport.clone()),
        ),
    )
}

pub fn users_page(users: &[User], flash: Option<Flash>) -> String {
    layout("Users", flash, &user_table(users, true))
}

pub fn message_page(title: &str, message: &str) -> String {
    layout(
        title,
        None,
        &format!(
            r#"<p>{}</p>
<p><a href="javascript:history.back()">Back</a></p>"#,
            escape(message)
        ),
    )
}
