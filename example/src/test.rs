use super::*;

fn todo(id: u32, title: &str, done: bool) -> Todo {
    Todo {
        id,
        title: title.to_string(),
        url: format!("/todos/{id}"),
        done,
    }
}

#[test]
fn renders_items_through_partials() {
    let page = Page {
        owner: "King".to_string(),
        todos: vec![todo(1, "Mix", false), todo(2, "<Press>", true)],
    };
    assert_eq!(
        render_page(&page).unwrap(),
        "<h1>King's list</h1>\n<ul>\n\
         <li class=\"open\"><button id=\"todo-1\">Mix</button>\n <a href=\"/todos/1\">open</a></li>\n\
         \n\
         <li class=\"done\"><button id=\"todo-2\">&lt;Press&gt;</button>\n <a href=\"/todos/2\">open</a></li>\n\
         \n</ul>"
    );
}

#[test]
fn empty_list_uses_the_inverse() {
    let page = Page {
        owner: "Tubby".to_string(),
        todos: Vec::new(),
    };
    assert_eq!(
        render_page(&page).unwrap(),
        "<h1>Tubby's list</h1>\n<ul><li>Nothing to do</li>\n</ul>"
    );
}

#[test]
fn partials_are_embedded() {
    let names = runtime().partials.names().into_iter().map(str::to_string).collect::<Vec<_>>();
    assert_eq!(names, vec!["button", "todo/item"]);
}
