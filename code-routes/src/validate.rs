//! Checks run on the whole tree before any template is derived.

use crate::{
    error::Error,
    model::{ActionNode, ControllerNode, ControllerTree, name_equals},
    template,
};
use std::{
    any::TypeId,
    collections::{BTreeSet, HashSet},
};
use tracing::warn;

pub(crate) fn validate(tree: &ControllerTree) -> Result<(), Error> {
    check_overloads(tree)?;
    check_custom_routes(tree)?;
    Ok(())
}

/// Actions sharing a name, when at least one of them takes route
/// parameters.
fn overload_groups(controller: &ControllerNode) -> Vec<Vec<&ActionNode>> {
    let mut groups: Vec<Vec<&ActionNode>> = Vec::new();

    for action in controller.actions() {
        let group = groups.iter_mut().find(|group| {
            group
                .first()
                .is_some_and(|first| name_equals(first.name(), action.name()))
        });
        match group {
            Some(group) => group.push(action),
            None => groups.push(vec![action]),
        }
    }

    groups.retain(|group| {
        group.len() > 1 && group.iter().any(|action| !action.route_parameters().is_empty())
    });
    groups
}

fn same_route_parameters(a: &ActionNode, b: &ActionNode) -> bool {
    a.route_parameters().len() == b.route_parameters().len()
        && a.route_parameters()
            .iter()
            .zip(b.route_parameters())
            .all(|(a, b)| a.same_shape(b))
}

fn check_overloads(tree: &ControllerTree) -> Result<(), Error> {
    let groups = tree
        .controllers()
        .iter()
        .flat_map(|controller| {
            overload_groups(controller)
                .into_iter()
                .map(move |group| (controller, group))
        })
        .collect::<Vec<_>>();

    // ambiguity is reported before incompatibility, across all controllers
    for (_, group) in &groups {
        let counts = group
            .iter()
            .map(|action| action.route_parameters().len())
            .collect::<BTreeSet<_>>();
        if counts.len() < 2 {
            continue;
        }

        let methods = group
            .iter()
            .filter(|action| !action.requires_route_parameters())
            .map(|action| action.signature())
            .collect::<Vec<_>>();
        if !methods.is_empty() {
            warn!(?methods, "ambiguous action overloads");
            return Err(Error::AmbiguousOverload { methods });
        }
    }

    for (controller, group) in &groups {
        let Some((first, rest)) = group.split_first() else {
            continue;
        };
        let same_count = rest
            .iter()
            .all(|action| action.route_parameters().len() == first.route_parameters().len());

        if same_count && !rest.iter().all(|action| same_route_parameters(first, action)) {
            warn!(
                controller = controller.type_name(),
                action = first.name(),
                "incompatible action overloads"
            );
            return Err(Error::IncompatibleOverload {
                controller: controller.type_name().to_owned(),
                method: first.method_name().to_owned(),
            });
        }
    }

    Ok(())
}

/// A custom route without `{action}` must resolve to a single action.
fn check_custom_routes(tree: &ControllerTree) -> Result<(), Error> {
    let mut routes: Vec<(String, String, Vec<(&ControllerNode, &ActionNode)>)> = Vec::new();

    for controller in tree.controllers() {
        for action in controller.actions() {
            let Some(custom) = action.custom_route() else {
                continue;
            };
            if custom.has_action_token() {
                continue;
            }

            let route = template::render(&template::custom_segments(controller, action, custom));
            let key = route.to_lowercase();
            match routes.iter_mut().find(|(k, ..)| *k == key) {
                Some((.., members)) => members.push((controller, action)),
                None => routes.push((key, route, vec![(controller, action)])),
            }
        }
    }

    for (_, route, members) in routes {
        let actions = members
            .iter()
            .map(|(controller, action)| {
                (ControllerNode::type_id(controller), action.name().to_lowercase())
            })
            .collect::<HashSet<(TypeId, String)>>();

        if actions.len() > 1 {
            let methods = members
                .iter()
                .map(|(_, action)| action.signature())
                .collect::<Vec<_>>();
            warn!(%route, ?methods, "custom route shared by different actions");
            return Err(Error::CustomRouteConflict { route, methods });
        }
    }

    Ok(())
}
