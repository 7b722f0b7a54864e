use code_routes::*;
use proptest::prelude::*;

struct ApiController;
struct UserController;
struct OrderController;
struct ReportController;

fn catalog() -> Catalog {
    Catalog::new()
        .descriptor(
            ControllerDeclaration::new::<ApiController>("ApiController", "app::api").with_actions([
                ActionDescriptor::new("Index"),
                ActionDescriptor::new("Health").verb(Verb::Get),
            ]),
        )
        .descriptor(
            ControllerDeclaration::new::<UserController>("UserController", "app::api::admin::user")
                .with_actions([
                    ActionDescriptor::new("Index"),
                    ActionDescriptor::new("Edit")
                        .parameter(ParameterDescriptor::new::<i32>("id"))
                        .verb(Verb::Get),
                    ActionDescriptor::new("Edit")
                        .parameter(ParameterDescriptor::new::<i32>("id"))
                        .custom_route("{id}")
                        .verb(Verb::Post),
                    ActionDescriptor::new("Search")
                        .parameter(ParameterDescriptor::new::<String>("q").optional())
                        .parameter(ParameterDescriptor::new::<i32>("page").default_value("1")),
                ]),
        )
        .descriptor(
            ControllerDeclaration::new::<OrderController>("OrderController", "app::api::shop")
                .route_property(ParameterDescriptor::new::<String>("customer"))
                .with_actions([
                    ActionDescriptor::new("List")
                        .parameter(ParameterDescriptor::new::<bool>("open").optional()),
                    ActionDescriptor::new("Details")
                        .parameter(ParameterDescriptor::new::<u64>("number"))
                        .parameter(ParameterDescriptor::new::<f64>("ratio").optional()),
                    ActionDescriptor::new("Track")
                        .parameter(ParameterDescriptor::new::<u64>("number"))
                        .custom_route("/tracking/{customer}/{number}")
                        .absolute(),
                ]),
        )
        .descriptor(
            ControllerDeclaration::new::<ReportController>("ReportController", "app::api::shop")
                .with_actions([ActionDescriptor::new("Daily")
                    .parameter(ParameterDescriptor::new::<String>("day"))
                    .custom_route("{action}/{day}")]),
        )
}

fn settings() -> RouteSettings {
    RouteSettings::default().with_route_formatter(format::lower_case())
}

fn sample(token: &RouteToken) -> &'static str {
    match token.type_name() {
        "bool" => "true",
        "f64" => "2.5",
        "alloc::string::String" => "text",
        _ => "42",
    }
}

#[test]
fn generate_match_identity() -> Result<(), Box<dyn std::error::Error>> {
    let table = RouteTable::build::<ApiController>(&catalog(), &settings())?;

    for route in &table {
        let mut url = String::new();
        for segment in route.segments() {
            url.push('/');
            match segment {
                Segment::Literal(text) => url.push_str(text),
                Segment::Token(token) => {
                    let token = route.token(token).ok_or("template token has no type")?;
                    url.push_str(sample(token));
                }
            }
        }
        let verb = route
            .verbs()
            .and_then(|verbs| verbs.iter().next().copied())
            .unwrap_or(Verb::Get);

        let matched = table
            .recognize(verb, &url)
            .ok_or_else(|| format!("`{url}` does not match any route"))?;
        assert_eq!(matched.controller(), route.controller(), "{url}");
        assert!(matched.action().eq_ignore_ascii_case(route.action()), "{url}");
    }

    Ok(())
}

#[test]
fn example_tree() -> Result<(), Error> {
    let table = RouteTable::build::<ApiController>(&catalog(), &settings())?;
    let routes = table.iter().map(RouteTemplate::template).collect::<Vec<_>>();

    assert_eq!(
        routes,
        [
            "",
            "health",
            "admin/user/{id}",
            "admin/user",
            "admin/user/edit/{id}",
            "admin/user/search/{q}/{page}",
            "admin/user/search/{q}",
            "admin/user/search",
            "tracking/{customer}/{number}",
            "shop/order/{customer}/list/{open}",
            "shop/order/{customer}/list",
            "shop/order/{customer}/details/{number}/{ratio}",
            "shop/order/{customer}/details/{number}",
            "shop/report/daily/{day}",
        ]
    );

    Ok(())
}

#[test]
fn custom_and_generated_edit() -> Result<(), Error> {
    let table = RouteTable::build::<ApiController>(&catalog(), &settings())?;

    for path in ["/admin/user/edit/42", "/admin/user/0"] {
        let verb = if path.contains("edit") { Verb::Get } else { Verb::Post };
        let matched = table.recognize(verb, path);
        assert!(matched.as_ref().is_some_and(RouteMatch::is_controller::<UserController>));
        assert_eq!(matched.as_ref().map(RouteMatch::action), Some("Edit"));
    }
    for id in ["01", "+5"] {
        assert!(table.recognize(Verb::Post, &format!("/admin/user/{id}")).is_none());
    }

    Ok(())
}

#[test]
fn optional_parameters() -> Result<(), Error> {
    let table = RouteTable::build::<ApiController>(&catalog(), &settings())?;
    let search = table
        .iter()
        .filter(|route| route.action() == "Search")
        .collect::<Vec<_>>();

    // K + 1 templates, each one a prefix of the previous
    assert_eq!(search.len(), 3);
    for pair in search.windows(2) {
        let (longer, shorter) = (pair[0].segments(), pair[1].segments());
        assert_eq!(longer.len(), shorter.len() + 1);
        assert_eq!(&longer[..shorter.len()], shorter);
    }

    let matched = table.recognize(Verb::Get, "/admin/user/search/rust");
    assert_eq!(matched.as_ref().and_then(|m| m.get::<i32>("page")), Some(&1));
    assert_eq!(matched.as_ref().and_then(|m| m.get::<String>("q")).map(String::as_str), Some("rust"));

    let matched = table.recognize(Verb::Get, "/admin/user/search/rust%20lang%2Fcore/2");
    assert_eq!(matched.as_ref().and_then(|m| m.text("q")), Some("rust lang/core"));
    assert_eq!(matched.as_ref().and_then(|m| m.get::<i32>("page")), Some(&2));

    Ok(())
}

#[test]
fn root_elision() -> Result<(), Error> {
    let table = RouteTable::build::<ApiController>(&catalog(), &settings())?;

    let root = table.controller::<ApiController>();
    assert_eq!(root.map(ControllerRoute::url_template), Some(""));

    let report = table.controller::<ReportController>();
    assert_eq!(report.map(ControllerRoute::url_template), Some("shop/{controller}"));
    assert_eq!(report.map(ControllerRoute::controller_url), Some("shop/report"));

    // any other controller can be the root of its own table
    let table = RouteTable::build::<UserController>(&catalog(), &settings())?;
    assert_eq!(table.url_for::<UserController>("Edit", &[("id", "3")]).as_deref(), Ok("/3"));
    assert_eq!(table.controllers().len(), 1);

    Ok(())
}

fn build(actions: Vec<ActionDescriptor>) -> Result<RouteTable, Error> {
    let catalog = Catalog::new().descriptor(
        ControllerDeclaration::new::<ApiController>("ApiController", "app::api").with_actions(actions),
    );
    RouteTable::build::<ApiController>(&catalog, &RouteSettings::default())
}

#[test]
fn ambiguous_overloads() {
    let ret = build(vec![
        ActionDescriptor::new("Show").verb(Verb::Get),
        ActionDescriptor::new("Show").parameter(ParameterDescriptor::new::<i32>("id")),
    ]);
    let Err(err) = ret else {
        panic!("overloads should be ambiguous");
    };

    assert!(matches!(err, Error::AmbiguousOverload { .. }));
    assert_eq!(
        err.to_string(),
        "the following action methods must be marked `require_route_parameters` for disambiguation: \
         ApiController::Show(), ApiController::Show(i32)"
    );
}

#[test]
fn incompatible_overloads() {
    let ret = build(vec![
        ActionDescriptor::new("Move")
            .parameter(ParameterDescriptor::new::<i32>("from"))
            .parameter(ParameterDescriptor::new::<i32>("to")),
        ActionDescriptor::new("Move")
            .parameter(ParameterDescriptor::new::<i32>("to"))
            .parameter(ParameterDescriptor::new::<i32>("from")),
    ]);
    assert!(matches!(ret, Err(Error::IncompatibleOverload { .. })));
}

#[test]
fn custom_route_conflict() {
    let ret = build(vec![
        ActionDescriptor::new("Show")
            .parameter(ParameterDescriptor::new::<i32>("id"))
            .custom_route("{id}"),
        ActionDescriptor::new("Remove")
            .parameter(ParameterDescriptor::new::<i32>("id"))
            .custom_route("{id}"),
    ]);
    assert!(matches!(ret, Err(Error::CustomRouteConflict { .. })));
}

#[test]
fn model_errors_fail_the_build() {
    let ret = build(vec![
        ActionDescriptor::new("Show").parameter(ParameterDescriptor::new::<i32>("id").constraint("(")),
    ]);
    assert!(matches!(ret, Err(Error::Model(ModelError::InvalidConstraint { .. }))));
}

proptest! {
    #[test]
    fn integer_tokens_round_trip(id in any::<i32>(), number in any::<u64>()) {
        let table = RouteTable::build::<ApiController>(&catalog(), &settings()).map_err(|err| TestCaseError::fail(err.to_string()))?;

        let id_text = id.to_string();
        let url = table.url_for::<UserController>("Edit", &[("id", &id_text)]);
        prop_assert!(url.is_ok());
        let url = url.unwrap_or_default();
        let matched = table.recognize(Verb::Post, &url);
        prop_assert_eq!(matched.as_ref().and_then(|m| m.get::<i32>("id")), Some(&id));

        let number_text = number.to_string();
        let url = table
            .url_for::<OrderController>("Track", &[("customer", "acme"), ("number", &number_text)])
            .unwrap_or_default();
        let matched = table.recognize(Verb::Get, &url);
        prop_assert_eq!(matched.as_ref().and_then(|m| m.get::<u64>("number")), Some(&number));
    }

    #[test]
    fn string_tokens_round_trip(q in "\\PC{1,16}", customer in "\\PC{1,16}") {
        let table = RouteTable::build::<ApiController>(&catalog(), &settings()).map_err(|err| TestCaseError::fail(err.to_string()))?;

        let url = table.url_for::<UserController>("Search", &[("q", &q)]);
        prop_assert!(url.is_ok());
        let url = url.unwrap_or_default();
        let matched = table.recognize(Verb::Get, &url);
        prop_assert_eq!(matched.as_ref().map(RouteMatch::action), Some("Search"));
        prop_assert_eq!(matched.as_ref().and_then(|m| m.get::<String>("q")), Some(&q));

        let url = table
            .url_for::<OrderController>("List", &[("customer", &customer)])
            .unwrap_or_default();
        let matched = table.recognize(Verb::Get, &url);
        prop_assert_eq!(matched.as_ref().map(RouteMatch::action), Some("List"));
        prop_assert_eq!(matched.as_ref().and_then(|m| m.text("customer")), Some(customer.as_str()));
    }
}
