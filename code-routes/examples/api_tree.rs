#![allow(dead_code, unused_variables)]

use code_routes::*;

mod api {
    use code_routes::*;

    #[derive(Controller)]
    pub struct ApiController;

    #[actions]
    impl ApiController {
        pub fn index(&self) {}

        pub fn status(&self) {}
    }

    pub mod admin {
        use code_routes::*;

        #[derive(Controller)]
        pub struct AdminController {
            #[from_route(constraint = "[a-z]{2}")]
            lang: String,
        }

        pub mod user {
            use code_routes::*;

            #[derive(Controller)]
            #[controller(extends = super::AdminController)]
            pub struct UserController;

            #[actions]
            impl UserController {
                pub fn index(&self) {}

                #[action(custom_route = "{id}", verbs(get))]
                pub fn edit(&self, id: u32) {}

                #[action(name = "Edit", custom_route = "{id}", verbs(post))]
                pub fn save(&self, id: u32, #[from_body] form: String) {}

                pub fn search(&self, q: Option<String>, #[from_route(default = 1)] page: Option<u32>) {}

                #[non_action]
                pub fn audit(&self) {}
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let catalog = Catalog::new()
        .controller::<api::ApiController>()
        .controller::<api::admin::user::UserController>();

    let settings = RouteSettings::default()
        .with_base_route("v1")
        .with_route_formatter(format::hyphenate());
    let table = RouteTable::build::<api::ApiController>(&catalog, &settings)?;

    for route in &table {
        println!("{:>2} {route}", route.name());
    }

    assert_eq!(
        table.url_for::<api::admin::user::UserController>("edit", &[("id", "5"), ("lang", "en")])?,
        "/v1/admin/user/en/5"
    );
    assert_eq!(
        table.url_for::<api::admin::user::UserController>("search", &[("lang", "fr")])?,
        "/v1/admin/user/fr/search"
    );

    let matched = table.recognize(Verb::Post, "/v1/admin/user/en/5");
    assert_eq!(matched.as_ref().map(RouteMatch::method_name), Some("save"));

    Ok(())
}
