use crate::{developers::Developer, search::Stats};

const STYLE: &str = "body{font-family:sans-serif;max-width:960px;margin:2rem auto;padding:0 1rem}\
nav a{margin-right:1rem}table{border-collapse:collapse}td,th{border:1px solid #ccc;padding:.3rem .6rem}\
pre{background:#f6f6f6;padding:1rem;overflow:auto}";

/// Posts the first form on the page to `action` and prints the JSON reply.
const FORM_SCRIPT: &str = r#"<script>
document.querySelector('form').addEventListener('submit', async (e) => {
  e.preventDefault();
  const body = new URLSearchParams(new FormData(e.target));
  const res = await fetch(e.target.action, {method: 'POST', body});
  document.getElementById('out').textContent = JSON.stringify(await res.json(), null, 2);
});
</script>"#;

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
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

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!doctype html>
<html lang="ko">
<head><meta charset="utf-8"><title>{title}</title><style>{STYLE}</style></head>
<body>
<nav><a href="/">홈</a><a href="/search">검색</a><a href="/filter">필터</a><a href="/stats">통계</a></nav>
<h1>{title}</h1>
{body}
</body>
</html>"#,
        title = escape(title),
    )
}

fn select(name: &str, options: &[&str]) -> String {
    let options: String = options
        .iter()
        .map(|o| format!(r#"<option value="{o}">{o}</option>"#))
        .collect();
    format!(r#"<select name="{name}"><option value="">-</option>{options}</select>"#)
}

pub fn index() -> String {
    let body = format!(
        r#"<p>자연어로 개발자를 검색합니다. 예: <code>서울 시니어 백엔드 3년이상</code></p>
<form method="post" action="/api/init-data"><button>샘플 데이터 생성</button></form>
<pre id="out"></pre>{FORM_SCRIPT}"#
    );
    layout("개발자 검색", &body)
}

pub fn search() -> String {
    let body = format!(
        r#"<form method="post" action="/api/search">
<input name="query" size="40" placeholder="서울 시니어 백엔드 3년이상" required>
{}
{}
<input name="limit" type="number" value="10" min="1" max="100">
<button>검색</button>
</form>
<pre id="out"></pre>{FORM_SCRIPT}"#,
        select("search_type", &["comprehensive", "profile_only"]),
        select("filter_mode", &["default", "strict", "flexible"]),
    );
    layout("검색", &body)
}

pub fn filter() -> String {
    let body = format!(
        r#"<form method="post" action="/api/filter">
{}
{}
{}
{}
<input name="limit" type="number" value="10" min="1" max="100">
<button>필터</button>
</form>
<pre id="out"></pre>{FORM_SCRIPT}"#,
        select("seniority", &["junior", "mid", "senior"]),
        select("primary_role", &["frontend", "backend", "fullstack", "devops"]),
        select("availability", &["available", "busy", "considering"]),
        select(
            "location",
            &["서울", "경기", "부산", "대구", "대전", "광주", "인천"]
        ),
    );
    layout("필터 검색", &body)
}

pub fn stats(stats: &Stats) -> String {
    let body = format!(
        "<table>\
<tr><th>프로필</th><td>{}</td></tr>\
<tr><th>기술</th><td>{}</td></tr>\
<tr><th>경력</th><td>{}</td></tr>\
<tr><th>전체</th><td>{}</td></tr>\
</table>",
        stats.profiles, stats.skills, stats.experience, stats.total
    );
    layout("통계", &body)
}

pub fn profile(dev: &Developer) -> String {
    let skills: String = dev
        .skills
        .iter()
        .map(|s| {
            format!(
                "<tr><td>{}</td><td>{}/5</td><td>{}년</td></tr>",
                escape(&s.name),
                s.level,
                s.years
            )
        })
        .collect();
    let experience: String = dev
        .experience
        .iter()
        .map(|e| {
            format!(
                "<tr><td>{}</td><td>{}</td><td>{}개월</td><td>{}</td></tr>",
                escape(&e.company),
                escape(&e.position),
                e.duration_months,
                escape(&e.industry)
            )
        })
        .collect();

    let body = format!(
        "<p>{seniority} {role} · {years}년 경력 · {location} · {availability}</p>\
<p>희망 연봉: {salary} · 학력: {degree} {major}</p>\
<h2>기술</h2><table><tr><th>기술</th><th>숙련도</th><th>경험</th></tr>{skills}</table>\
<h2>경력</h2><table><tr><th>회사</th><th>직무</th><th>기간</th><th>업계</th></tr>{experience}</table>",
        seniority = escape(&dev.seniority),
        role = escape(&dev.primary_role),
        years = dev.years_experience,
        location = escape(&dev.location),
        availability = escape(&dev.availability),
        salary = escape(&dev.salary_range),
        degree = escape(&dev.education.degree),
        major = escape(&dev.education.major),
    );
    layout(&format!("{} ({})", dev.name, dev.developer_id), &body)
}

pub fn error(message: &str) -> String {
    layout("오류", &format!("<p>{}</p>", escape(message)))
}
